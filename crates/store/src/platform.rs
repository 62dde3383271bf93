//! Per-platform application directories.

use crate::error::StoreError;
use crate::managed::ManagedDirectory;
use std::path::PathBuf;

/// Redirects system-level directories (never user-level ones) for tests without admin rights.
pub const TEST_BASE_PATH_ENV: &str = "OSPROFILES_TEST_BASE_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }
}

/// Data and configuration directories for one application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirectories {
    pub user_data: PathBuf,
    pub user_config: PathBuf,
    pub system_data: PathBuf,
    pub system_config: PathBuf,
    /// Managed preferences directory; only macOS has one.
    pub managed: Option<PathBuf>,
}

impl AppDirectories {
    /// Directories for `namespace` (optionally grouped under `publisher`) on this machine.
    ///
    /// # Errors
    /// [`StoreError::Internal`] if the user's home or app-data location is unknown.
    pub fn new(publisher: Option<&str>, namespace: &str) -> Result<Self, StoreError> {
        Self::resolve(Os::current(), publisher, namespace, |name| std::env::var(name).ok())
    }

    /// Resolves directories for `os`, reading environment variables through `env`.
    ///
    /// # Errors
    /// [`StoreError::Internal`] if a required variable is missing.
    pub fn resolve(
        os: Os,
        publisher: Option<&str>,
        namespace: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StoreError> {
        let app = |base: PathBuf| match publisher.filter(|p| !p.is_empty()) {
            Some(publisher) => base.join(publisher).join(namespace),
            None => base.join(namespace),
        };
        let required = |name: &'static str| {
            env(name).filter(|v| !v.is_empty()).map(PathBuf::from).ok_or_else(|| {
                StoreError::Internal {
                    message: format!("environment variable {name} is not set").into(),
                    context: Some("Resolving application directories".into()),
                }
            })
        };
        let test_base = env(TEST_BASE_PATH_ENV).filter(|v| !v.is_empty()).map(PathBuf::from);
        let system_root = test_base.clone().unwrap_or_else(|| PathBuf::from("/"));

        let dirs = match os {
            Os::Linux => {
                let home = required("HOME")?;
                Self {
                    user_data: app(home.join(".local").join("share")),
                    user_config: app(home.join(".config")),
                    system_data: app(system_root.join("var").join("lib")),
                    system_config: app(system_root.join("etc")),
                    managed: None,
                }
            },
            Os::MacOs => {
                let home = required("HOME")?;
                let library = system_root.join("Library");
                Self {
                    user_data: app(home.join("Library").join("Application Support")),
                    user_config: app(home.join("Library").join("Preferences")),
                    system_data: app(library.join("Application Support")),
                    system_config: app(library.join("Preferences")),
                    managed: Some(library.join("Managed Preferences")),
                }
            },
            Os::Windows => {
                let local = required("LOCALAPPDATA")?;
                let (program_data, program_files) = match &test_base {
                    Some(base) => (base.join("ProgramData"), base.join("ProgramFiles")),
                    None => (required("PROGRAMDATA")?, required("PROGRAMFILES")?),
                };
                Self {
                    user_data: app(local.clone()),
                    user_config: app(local),
                    system_data: app(program_data),
                    system_config: app(program_files),
                    managed: None,
                }
            },
        };

        Ok(dirs)
    }

    /// Managed preferences as a [`ManagedSource`](crate::ManagedSource) reading `<identifier>.plist`.
    #[must_use]
    pub fn managed_source(&self) -> Option<ManagedDirectory> {
        self.managed.as_ref().map(|root| ManagedDirectory::with_extension(root, "plist"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| (*v).to_owned())
    }

    #[test]
    fn test_linux_layout_with_publisher() {
        let dirs =
            AppDirectories::resolve(Os::Linux, Some("acme"), "tool", env(&[("HOME", "/home/u")]))
                .unwrap();
        assert_eq!(dirs.user_data, Path::new("/home/u/.local/share/acme/tool"));
        assert_eq!(dirs.user_config, Path::new("/home/u/.config/acme/tool"));
        assert_eq!(dirs.system_data, Path::new("/var/lib/acme/tool"));
        assert_eq!(dirs.system_config, Path::new("/etc/acme/tool"));
        assert!(dirs.managed_source().is_none());
    }

    #[test]
    fn test_base_override_only_moves_system_dirs() {
        let dirs = AppDirectories::resolve(
            Os::MacOs,
            None,
            "tool",
            env(&[("HOME", "/Users/u"), (TEST_BASE_PATH_ENV, "/tmp/base")]),
        )
        .unwrap();
        assert_eq!(dirs.user_data, Path::new("/Users/u/Library/Application Support/tool"));
        assert_eq!(dirs.system_data, Path::new("/tmp/base/Library/Application Support/tool"));
        assert_eq!(dirs.managed.as_deref(), Some(Path::new("/tmp/base/Library/Managed Preferences")));
    }

    #[test]
    fn test_windows_needs_app_data() {
        let err = AppDirectories::resolve(Os::Windows, None, "tool", env(&[])).unwrap_err();
        assert!(matches!(err, StoreError::Internal { .. }));

        let dirs = AppDirectories::resolve(
            Os::Windows,
            None,
            "tool",
            env(&[("LOCALAPPDATA", "C:/Users/u/AppData/Local"), (TEST_BASE_PATH_ENV, "D:/t")]),
        )
        .unwrap();
        assert_eq!(dirs.system_data, Path::new("D:/t/ProgramData/tool"));
    }
}
