//! Named profiles on top of a single driver kind.
//!
//! The registry keeps one bookkeeping record under [`GLOBAL_KEY`] listing every profile
//! and the default one. Each profile lives in its own record, `profile-<name>`, in the
//! same namespace.

use osprofiles_store::{
    Classified, Driver, DriverKind, Store, StoreConfig, StoreError, profile_model,
};
use tracing::{debug, info, warn};

use crate::config::ProfilesConfig;
use crate::error::{ProfileError, ProfileErrorExt};

pub const GLOBAL_KEY: &str = "global";
pub const PROFILE_KEY_PREFIX: &str = "profile";

/// Layout version of [`GlobalState`]. Older states are rewritten on open.
pub const REGISTRY_VERSION: &str = "1.0";

/// Bookkeeping record of the registry.
#[profile_model]
#[derive(Clone, Default, PartialEq, Eq)]
pub struct GlobalState {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(rename = "defaultProfile", default)]
    pub default_profile: String,
}

/// A record that knows its own profile name.
pub trait NamedProfile {
    fn profile_name(&self) -> &str;
}

/// Store key of the profile called `name`.
#[must_use]
pub fn profile_store_key(name: &str) -> String {
    format!("{PROFILE_KEY_PREFIX}-{name}")
}

/// Checks `name` against `^[a-z0-9]([a-z0-9_-]?[a-z0-9])*$`.
///
/// Lowercase ASCII letters and digits, with single `-` or `_` separators that never
/// lead, trail or repeat.
///
/// # Errors
/// [`ProfileError::InvalidName`] describing the first offending character.
pub fn validate_profile_name(name: &str) -> Result<(), ProfileError> {
    let invalid = |reason: String| ProfileError::InvalidName {
        message: reason.into(),
        context: Some(format!("profile `{name}`").into()),
    };
    let is_alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let is_separator = |c: char| c == '-' || c == '_';

    let mut previous: Option<char> = None;
    for (index, c) in name.chars().enumerate() {
        if is_separator(c) {
            if previous.is_none_or(is_separator) {
                return Err(invalid(format!("separator `{c}` at position {index}")));
            }
        } else if !is_alnum(c) {
            return Err(invalid(format!("character `{c}` at position {index}")));
        }
        previous = Some(c);
    }

    match previous {
        None => Err(invalid("name is empty".to_owned())),
        Some(last) if is_separator(last) => Err(invalid("name ends with a separator".to_owned())),
        Some(_) => Ok(()),
    }
}

/// One open profile record.
#[derive(Debug)]
pub struct ProfileHandle {
    name: String,
    store: Driver,
}

impl ProfileHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn driver(&self) -> &Driver {
        &self.store
    }

    pub const fn driver_mut(&mut self) -> &mut Driver {
        &mut self.store
    }

    /// Reads the profile, starting from `R::default()`.
    ///
    /// # Errors
    /// [`ProfileError::Store`] for any driver failure.
    pub fn load<R: Classified + Default>(&self) -> Result<R, ProfileError> {
        self.store.get_record::<R>().context(format!("Loading profile `{}`", self.name))
    }

    /// Overwrites the stored profile.
    ///
    /// # Errors
    /// [`ProfileError::InvalidName`] if the record names another profile;
    /// [`ProfileError::Store`] for driver failures.
    pub fn save<R: Classified + NamedProfile>(&mut self, profile: &R) -> Result<(), ProfileError> {
        if profile.profile_name() != self.name {
            return Err(ProfileError::InvalidName {
                message: format!("record is named `{}`", profile.profile_name()).into(),
                context: Some(format!("saving into profile `{}`", self.name).into()),
            });
        }
        self.store.set(profile).context(format!("Saving profile `{}`", self.name))
    }
}

/// Registry of named profiles for one namespace.
///
/// ```rust
/// use osprofiles::{NamedProfile, ProfileRegistry};
/// use osprofiles::store::{DriverKind, MemoryArena, StoreConfig, profile_model};
///
/// #[profile_model]
/// #[derive(Clone, Default)]
/// struct Account {
///     name: String,
///     #[security(secure)]
///     token: String,
/// }
///
/// impl NamedProfile for Account {
///     fn profile_name(&self) -> &str {
///         &self.name
///     }
/// }
///
/// # fn main() -> Result<(), osprofiles::ProfileError> {
/// let config = StoreConfig::builder().memory(MemoryArena::new()).build();
/// let mut registry = ProfileRegistry::open("demo", DriverKind::Memory, config)?;
///
/// registry.add_profile(&Account { name: "work".into(), token: "t-1".into() }, false)?;
/// assert_eq!(registry.default_profile(), Some("work"));
///
/// let account: Account = registry.load_profile("work")?;
/// assert_eq!(account.token, "t-1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProfileRegistry {
    namespace: String,
    kind: DriverKind,
    config: StoreConfig,
    global: Driver,
    state: GlobalState,
}

impl ProfileRegistry {
    /// Opens the registry, creating its bookkeeping record on first use.
    ///
    /// # Errors
    /// [`ProfileError::Store`] if the namespace is invalid or the driver cannot be used.
    pub fn open(
        namespace: impl Into<String>,
        kind: DriverKind,
        config: StoreConfig,
    ) -> Result<Self, ProfileError> {
        let namespace = namespace.into();
        let mut global =
            Driver::open(kind, &namespace, GLOBAL_KEY, &config).context("Opening profile registry")?;

        let mut state = if global.exists() {
            global.get_record::<GlobalState>().context("Reading profile registry")?
        } else {
            GlobalState::default()
        };

        if state.version != REGISTRY_VERSION {
            if !state.version.is_empty() {
                info!(from = %state.version, to = REGISTRY_VERSION, "Upgrading profile registry");
            }
            state.version = REGISTRY_VERSION.to_owned();
            global.set(&state).context("Writing profile registry")?;
        }

        info!(namespace = %namespace, driver = %kind, profiles = state.profiles.len(), "Profile registry ready");
        Ok(Self { namespace, kind, config, global, state })
    }

    /// Opens the registry described by a loaded configuration.
    ///
    /// # Errors
    /// See [`ProfileRegistry::open`].
    pub fn from_config(config: &ProfilesConfig) -> Result<Self, ProfileError> {
        Self::open(config.namespace.clone(), config.driver, config.store_config())
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub const fn driver_kind(&self) -> DriverKind {
        self.kind
    }

    #[must_use]
    pub const fn state(&self) -> &GlobalState {
        &self.state
    }

    /// Profile names in insertion order.
    #[must_use]
    pub fn profile_names(&self) -> &[String] {
        &self.state.profiles
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.state.profiles.iter().any(|p| p == name)
    }

    #[must_use]
    pub fn default_profile(&self) -> Option<&str> {
        Some(self.state.default_profile.as_str()).filter(|name| !name.is_empty())
    }

    /// Stores a new profile and registers it.
    ///
    /// The first profile becomes the default even when `set_default` is `false`.
    ///
    /// # Errors
    /// * [`ProfileError::InvalidName`] for a malformed name.
    /// * [`ProfileError::NameConflict`] if the name is already registered.
    /// * [`ProfileError::Store`] if the record or the registry cannot be written.
    pub fn add_profile<R: Classified + NamedProfile>(
        &mut self,
        profile: &R,
        set_default: bool,
    ) -> Result<ProfileHandle, ProfileError> {
        let name = profile.profile_name().to_owned();
        validate_profile_name(&name)?;
        if self.contains(&name) {
            return Err(ProfileError::NameConflict { message: name.into(), context: None });
        }

        let mut handle = self.handle(&name)?;
        handle.save(profile)?;

        let mut next = self.state.clone();
        next.profiles.push(name.clone());
        if set_default || self.default_profile().is_none() {
            next.default_profile.clone_from(&name);
        }
        if let Err(err) = self.commit(next) {
            if let Err(cleanup) = handle.store.destroy() {
                warn!(profile = %name, error = %cleanup, "Unregistered profile record left behind");
            }
            return Err(err);
        }

        debug!(namespace = %self.namespace, profile = %name, "Profile added");
        Ok(handle)
    }

    /// Opens a registered profile without reading it.
    ///
    /// # Errors
    /// [`ProfileError::NotFound`] if `name` is not registered.
    pub fn open_profile(&self, name: &str) -> Result<ProfileHandle, ProfileError> {
        validate_profile_name(name)?;
        if !self.contains(name) {
            return Err(ProfileError::NotFound { message: name.to_owned().into(), context: None });
        }
        self.handle(name)
    }

    /// Reads a registered profile.
    ///
    /// # Errors
    /// [`ProfileError::NotFound`] if `name` is not registered, [`ProfileError::Store`] otherwise.
    pub fn load_profile<R: Classified + Default>(&self, name: &str) -> Result<R, ProfileError> {
        self.open_profile(name)?.load()
    }

    /// Reads the default profile.
    ///
    /// # Errors
    /// [`ProfileError::MissingDefault`] when none is set.
    pub fn load_default<R: Classified + Default>(&self) -> Result<R, ProfileError> {
        let name = self.default_profile().ok_or_else(|| ProfileError::MissingDefault {
            message: self.namespace.clone().into(),
            context: None,
        })?;
        self.load_profile(name)
    }

    /// Marks a registered profile as the default.
    ///
    /// # Errors
    /// [`ProfileError::NotFound`] if `name` is not registered.
    pub fn set_default(&mut self, name: &str) -> Result<(), ProfileError> {
        if !self.contains(name) {
            return Err(ProfileError::NotFound { message: name.to_owned().into(), context: None });
        }
        let mut next = self.state.clone();
        next.default_profile = name.to_owned();
        self.commit(next)
    }

    /// Unregisters a profile and destroys its record, including its encryption key.
    ///
    /// # Errors
    /// * [`ProfileError::NotFound`] if `name` is not registered.
    /// * [`ProfileError::DeletingDefault`] for the default profile.
    /// * [`ProfileError::Store`] if the registry or the record cannot be updated.
    pub fn delete_profile(&mut self, name: &str) -> Result<(), ProfileError> {
        if !self.contains(name) {
            return Err(ProfileError::NotFound { message: name.to_owned().into(), context: None });
        }
        if self.default_profile() == Some(name) {
            return Err(ProfileError::DeletingDefault { message: name.to_owned().into(), context: None });
        }

        let mut handle = self.handle(name)?;
        let mut next = self.state.clone();
        next.profiles.retain(|p| p != name);
        self.commit(next)?;

        handle.store.destroy().context(format!("Deleting profile `{name}`"))?;
        debug!(namespace = %self.namespace, profile = %name, "Profile deleted");
        Ok(())
    }

    /// Destroys every profile, then the registry record itself.
    ///
    /// The registry stays usable and empty afterwards. Failures are collected; every
    /// profile is attempted.
    ///
    /// # Errors
    /// [`ProfileError::Store`] carrying the first failure, or a joined cleanup error.
    pub fn delete_all(&mut self) -> Result<(), ProfileError> {
        let mut failures = Vec::new();

        for name in std::mem::take(&mut self.state.profiles) {
            let outcome = Driver::open(self.kind, &self.namespace, &profile_store_key(&name), &self.config)
                .and_then(|mut store| store.destroy());
            if let Err(err) = outcome {
                warn!(profile = %name, error = %err, "Failed to delete profile");
                failures.push(err);
            }
        }
        self.state.default_profile.clear();

        if let Err(err) = self.global.destroy() {
            failures.push(err);
        }

        info!(namespace = %self.namespace, failures = failures.len(), "All profiles deleted");
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)).context("Deleting all profiles"),
            _ => Err(StoreError::Cleanup { errors: failures, context: None })
                .context("Deleting all profiles"),
        }
    }

    fn handle(&self, name: &str) -> Result<ProfileHandle, ProfileError> {
        let store = Driver::open(self.kind, &self.namespace, &profile_store_key(name), &self.config)
            .context(format!("Opening profile `{name}`"))?;
        Ok(ProfileHandle { name: name.to_owned(), store })
    }

    /// Writes `next` and adopts it only once it is stored.
    fn commit(&mut self, next: GlobalState) -> Result<(), ProfileError> {
        self.global.set(&next).context("Writing profile registry")?;
        self.state = next;
        Ok(())
    }
}
