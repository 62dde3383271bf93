use osprofiles::keyring::MemoryKeyring;
use osprofiles::store::{
    Artifact, DriverKind, HybridStore, MemoryArena, Store, StoreConfig, profile_model,
};
use osprofiles::{GLOBAL_KEY, NamedProfile, ProfileError, ProfileRegistry, profile_store_key};
use std::fs;
use std::sync::Arc;

#[profile_model]
#[derive(Clone, Default, PartialEq)]
struct ServiceProfile {
    name: String,
    endpoint: String,
    #[security(secure)]
    api_key: String,
    #[security(temporary)]
    session_token: String,
}

impl NamedProfile for ServiceProfile {
    fn profile_name(&self) -> &str {
        &self.name
    }
}

fn profile(name: &str) -> ServiceProfile {
    ServiceProfile {
        name: name.to_owned(),
        endpoint: format!("https://{name}.example.com"),
        api_key: format!("sk-{name}"),
        session_token: "live".to_owned(),
    }
}

fn hybrid_config(dir: &tempfile::TempDir, keyring: &MemoryKeyring) -> StoreConfig {
    StoreConfig::builder().directory(dir.path()).credentials(Arc::new(keyring.clone())).build()
}

#[test]
fn registry_survives_reopen_with_hybrid_driver() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();

    {
        let mut registry =
            ProfileRegistry::open("acme", DriverKind::Hybrid, hybrid_config(&dir, &keyring)).unwrap();
        registry.add_profile(&profile("work"), false).unwrap();
        registry.add_profile(&profile("home"), true).unwrap();
    }

    let registry =
        ProfileRegistry::open("acme", DriverKind::Hybrid, hybrid_config(&dir, &keyring)).unwrap();
    assert_eq!(registry.profile_names(), ["work", "home"]);
    assert_eq!(registry.default_profile(), Some("home"));
    assert_eq!(registry.state().version, osprofiles::REGISTRY_VERSION);

    let work: ServiceProfile = registry.load_profile("work").unwrap();
    assert_eq!(work.api_key, "sk-work");
    assert!(work.session_token.is_empty(), "temporary fields are never persisted");

    let home: ServiceProfile = registry.load_default().unwrap();
    assert_eq!(home.endpoint, "https://home.example.com");
}

#[test]
fn first_profile_becomes_default_and_names_are_unique() {
    let mut registry =
        ProfileRegistry::open("acme", DriverKind::Memory, StoreConfig::builder().memory(MemoryArena::new()).build())
            .unwrap();

    let err = registry.load_default::<ServiceProfile>().unwrap_err();
    assert!(matches!(err, ProfileError::MissingDefault { .. }));

    registry.add_profile(&profile("work"), false).unwrap();
    assert_eq!(registry.default_profile(), Some("work"));

    let err = registry.add_profile(&profile("work"), true).unwrap_err();
    assert!(matches!(err, ProfileError::NameConflict { .. }));

    let err = registry.add_profile(&profile("Bad Name"), false).unwrap_err();
    assert!(matches!(err, ProfileError::InvalidName { .. }));
    assert_eq!(registry.profile_names(), ["work"]);
}

#[test]
fn default_profile_cannot_be_deleted() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();
    let mut registry =
        ProfileRegistry::open("acme", DriverKind::Hybrid, hybrid_config(&dir, &keyring)).unwrap();
    registry.add_profile(&profile("work"), true).unwrap();
    registry.add_profile(&profile("home"), false).unwrap();

    let err = registry.delete_profile("work").unwrap_err();
    assert!(matches!(err, ProfileError::DeletingDefault { .. }));

    let err = registry.delete_profile("ghost").unwrap_err();
    assert!(matches!(err, ProfileError::NotFound { .. }));

    registry.set_default("home").unwrap();
    registry.delete_profile("work").unwrap();
    assert_eq!(registry.profile_names(), ["home"]);
}

#[test]
fn delete_profile_removes_artifacts_and_key() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();
    let mut registry =
        ProfileRegistry::open("acme", DriverKind::Hybrid, hybrid_config(&dir, &keyring)).unwrap();
    registry.add_profile(&profile("home"), true).unwrap();
    let mut handle = registry.add_profile(&profile("work"), false).unwrap();

    let secure = handle.driver_mut().as_hybrid_mut().unwrap().artifact_path(Artifact::Secure).unwrap();
    assert!(secure.exists());
    let urn = handle.driver().id().urn().to_owned();
    assert!(keyring.contains(&urn, &profile_store_key("work")));

    registry.delete_profile("work").unwrap();
    assert!(!secure.exists());
    assert!(!keyring.contains(&urn, &profile_store_key("work")));

    let err = registry.load_profile::<ServiceProfile>("work").unwrap_err();
    assert!(matches!(err, ProfileError::NotFound { .. }));
}

#[test]
fn delete_all_leaves_an_empty_registry() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();
    let mut registry =
        ProfileRegistry::open("acme", DriverKind::Hybrid, hybrid_config(&dir, &keyring)).unwrap();
    registry.add_profile(&profile("work"), true).unwrap();
    registry.add_profile(&profile("home"), false).unwrap();

    registry.delete_all().unwrap();
    assert!(registry.profile_names().is_empty());
    assert_eq!(registry.default_profile(), None);
    assert_eq!(keyring.len(), 0);

    let reopened =
        ProfileRegistry::open("acme", DriverKind::Hybrid, hybrid_config(&dir, &keyring)).unwrap();
    assert!(reopened.profile_names().is_empty());
}

#[test]
fn handle_refuses_records_of_another_profile() {
    let mut registry =
        ProfileRegistry::open("acme", DriverKind::Memory, StoreConfig::builder().memory(MemoryArena::new()).build())
            .unwrap();
    let mut handle = registry.add_profile(&profile("work"), false).unwrap();

    let err = handle.save(&profile("home")).unwrap_err();
    assert!(matches!(err, ProfileError::InvalidName { .. }));

    let mut updated = profile("work");
    updated.endpoint = "https://new.example.com".to_owned();
    handle.save(&updated).unwrap();
    assert_eq!(registry.open_profile("work").unwrap().load::<ServiceProfile>().unwrap().endpoint, updated.endpoint);
}

#[test]
fn failed_registry_write_rolls_back_the_new_profile() {
    let dir = tempfile::tempdir().unwrap();
    let keyring = MemoryKeyring::new();
    let mut registry =
        ProfileRegistry::open("acme", DriverKind::Hybrid, hybrid_config(&dir, &keyring)).unwrap();
    registry.add_profile(&profile("home"), true).unwrap();

    let global = HybridStore::open("acme", GLOBAL_KEY, &hybrid_config(&dir, &keyring)).unwrap();
    let blocked = global.artifact_path(Artifact::Plaintext).unwrap();
    fs::remove_file(&blocked).unwrap();
    fs::create_dir(&blocked).unwrap();
    fs::write(blocked.join("pinned"), b"x").unwrap();

    let err = registry.add_profile(&profile("work"), true).unwrap_err();
    assert!(matches!(err, ProfileError::Store { .. }), "unexpected error: {err}");
    assert_eq!(registry.profile_names(), ["home"]);
    assert_eq!(registry.default_profile(), Some("home"));

    let orphan =
        HybridStore::open("acme", &profile_store_key("work"), &hybrid_config(&dir, &keyring)).unwrap();
    assert!(!orphan.exists());
    assert!(!keyring.contains(orphan.id().urn(), &profile_store_key("work")));

    fs::remove_dir_all(&blocked).unwrap();
    registry.add_profile(&profile("work"), true).unwrap();
    assert_eq!(registry.profile_names(), ["home", "work"]);
}
