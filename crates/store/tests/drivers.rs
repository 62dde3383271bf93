use osprofiles_keyring::{CredentialStore, MemoryKeyring};
use osprofiles_store::{
    Artifact, Driver, DriverKind, FileStore, ManagedDirectory, MemoryArena, MemoryStore,
    PlainFileStore, Store, StoreConfig, StoreError, profile_model,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[profile_model]
#[derive(Clone, Default, PartialEq)]
struct Account {
    user: String,
    #[security(secure)]
    password: String,
    #[security(temporary)]
    otp: String,
}

#[profile_model]
#[derive(Clone, Default, PartialEq)]
struct Preferences {
    theme: String,
    font_size: u8,
}

fn config(dir: &TempDir, keyring: &MemoryKeyring) -> StoreConfig {
    StoreConfig::builder()
        .directory(dir.path())
        .credentials(Arc::new(keyring.clone()))
        .build()
}

fn account() -> Account {
    Account { user: "ada".into(), password: "hunter2".into(), otp: "123456".into() }
}

#[test]
fn test_every_driver_honours_the_contract() {
    for kind in [DriverKind::Keyring, DriverKind::File, DriverKind::Memory, DriverKind::Hybrid] {
        let dir = tempfile::tempdir().unwrap();
        let keyring = MemoryKeyring::new();
        let config = config(&dir, &keyring);

        let mut store = Driver::open(kind, "contract", "default", &config).unwrap();
        assert_eq!(store.kind(), kind);
        assert!(!store.exists(), "{kind}");
        assert!(store.get().unwrap_err().is_not_found(), "{kind}");

        store.set(&account()).unwrap();
        assert!(store.exists(), "{kind}");
        let loaded: Account = store.get_record().unwrap();
        assert_eq!(loaded.user, "ada", "{kind}");
        assert_eq!(loaded.password, "hunter2", "{kind}");

        store.delete().unwrap();
        assert!(!store.exists(), "{kind}");
        store.delete().unwrap();
    }
}

#[test]
fn test_non_hybrid_drivers_drop_temporary_fields() {
    for kind in [DriverKind::Keyring, DriverKind::File, DriverKind::Memory] {
        let dir = tempfile::tempdir().unwrap();
        let keyring = MemoryKeyring::new();
        let mut store = Driver::open(kind, "temp", "default", &config(&dir, &keyring)).unwrap();

        store.set(&account()).unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&store.get().unwrap()).unwrap();
        assert!(raw.get("otp").is_none(), "{kind}");
    }
}

#[test]
fn test_validation_runs_for_every_driver() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();
    let config = config(&dir, &keyring);
    for kind in DriverKind::ALL {
        let err = Driver::open(kind, "bad namespace", "k", &config).unwrap_err();
        assert!(matches!(err, StoreError::NamespaceInvalid { .. }), "{kind}");
        let err = Driver::open(kind, "ns", ".k", &config).unwrap_err();
        assert!(matches!(err, StoreError::KeyInvalid { .. }), "{kind}");
    }
}

#[test]
fn test_file_store_layout_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();
    let mut store = FileStore::open("legacy", "main", &config(&dir, &keyring)).unwrap();
    store.set(&account()).unwrap();

    let enc = fs::read(dir.path().join("urn.osprofiles.legacy.profile.v1.main.enc")).unwrap();
    assert!(!String::from_utf8_lossy(&enc).contains("hunter2"));

    let meta = store.metadata().unwrap().unwrap();
    assert_eq!(meta.profile_name, "main");
    assert_eq!(meta.encryption_alg, "AES-256-GCM");
    assert_eq!(meta.profile_format_version, "1.0");

    store.destroy().unwrap();
    assert!(!dir.path().join("urn.osprofiles.legacy.profile.v1.main.nfo").exists());
    assert!(!keyring.contains("urn.osprofiles.legacy.profile.v1", "main"));
}

#[test]
fn test_file_store_surfaces_keyring_outage() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();
    let mut store = FileStore::open("legacy", "main", &config(&dir, &keyring)).unwrap();
    store.set(&account()).unwrap();

    keyring.set_available(false);
    assert!(matches!(store.get(), Err(StoreError::Crypto { .. })));
}

#[test]
fn test_file_store_read_does_not_replace_a_lost_key() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();
    FileStore::open("legacy", "main", &config(&dir, &keyring)).unwrap().set(&account()).unwrap();
    keyring.delete("urn.osprofiles.legacy.profile.v1", "main").unwrap();

    let store = FileStore::open("legacy", "main", &config(&dir, &keyring)).unwrap();
    assert!(store.get().unwrap_err().is_missing_key());
    assert_eq!(keyring.len(), 0);
}

#[test]
fn test_plain_store_refuses_secure_types() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();
    let mut store = PlainFileStore::open("plain", "prefs", &config(&dir, &keyring)).unwrap();

    assert!(matches!(store.set(&account()), Err(StoreError::SecurityMode { .. })));

    let prefs = Preferences { theme: "dark".into(), font_size: 14 };
    store.set(&prefs).unwrap();
    let raw = fs::read_to_string(dir.path().join("urn.osprofiles.plain.profile.v1.prefs.json")).unwrap();
    assert!(raw.contains("dark"));
    assert_eq!(store.get_record::<Preferences>().unwrap(), prefs);
}

#[test]
fn test_plain_store_reads_managed_override() {
    let dir = tempfile::tempdir().unwrap();
    let managed = tempfile::tempdir().unwrap();
    fs::write(managed.path().join("org.prefs.json"), br#"{"theme":"corporate","font_size":12}"#)
        .unwrap();
    let config = StoreConfig::builder()
        .directory(dir.path())
        .managed("org.prefs", Arc::new(ManagedDirectory::new(managed.path())))
        .build();

    let store = PlainFileStore::open("plain", "prefs", &config).unwrap();
    assert!(store.exists());
    assert_eq!(store.get_record::<Preferences>().unwrap().theme, "corporate");
}

#[cfg(unix)]
#[test]
fn test_write_failure_under_managed_config_is_explained() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let managed = tempfile::tempdir().unwrap();
    fs::write(managed.path().join("org.prefs.json"), b"{}").unwrap();
    let config = StoreConfig::builder()
        .directory(dir.path())
        .managed("org.prefs", Arc::new(ManagedDirectory::new(managed.path())))
        .build();
    let mut store = PlainFileStore::open("plain", "prefs", &config).unwrap();

    fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o500)).unwrap();
    let canary = dir.path().join("canary");
    if fs::write(&canary, b"x").is_ok() {
        // Running with privileges that ignore directory permissions.
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o700)).unwrap();
        return;
    }

    let result = store.set(&Preferences::default());
    fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o700)).unwrap();
    assert!(matches!(result, Err(StoreError::ManagedConfiguration { .. })));
}

#[test]
fn test_memory_arena_is_shared_through_config() {
    let arena = MemoryArena::new();
    let config = StoreConfig::builder().memory(arena.clone()).build();

    let mut writer = MemoryStore::open("mem", "shared", &config).unwrap();
    writer.set(&Preferences { theme: "light".into(), font_size: 10 }).unwrap();
    let first = writer.metadata().unwrap();
    assert_eq!(first.profile_format_version, "0.0");

    let reader = MemoryStore::open("mem", "shared", &config).unwrap();
    assert!(reader.exists());
    assert_eq!(arena.len(), 1);

    writer.set(&Preferences { theme: "dark".into(), font_size: 10 }).unwrap();
    let second = reader.metadata().unwrap();
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(reader.get_record::<Preferences>().unwrap().theme, "dark");

    let isolated = MemoryStore::open("mem", "shared", &StoreConfig::default()).unwrap();
    assert!(!isolated.exists());
}

#[test]
fn test_artifact_suffixes() {
    let suffixes: Vec<_> = Artifact::ALL.iter().map(|a| a.suffix()).collect();
    assert!(suffixes.contains(&".secure.enc"));
    assert!(suffixes.contains(&".plaintext.json"));
    assert!(suffixes.contains(&".metadata.json"));
}
