use osprofiles_keyring::MemoryKeyring;
use osprofiles_vault::prelude::*;
use std::sync::Arc;

#[test]
fn test_wrong_key_cannot_open() {
    let sealed = Envelope::<Aes>::new(&EncryptionKey::generate().unwrap())
        .unwrap()
        .seal(b"profile secrets")
        .unwrap();

    let intruder = Envelope::<Aes>::new(&EncryptionKey::generate().unwrap()).unwrap();
    let err = intruder.open(&sealed).unwrap_err();
    assert!(matches!(err, VaultError::Decryption { .. }));
}

#[test]
fn test_truncated_blob_is_rejected() {
    let envelope = Envelope::<Aes>::new(&EncryptionKey::generate().unwrap()).unwrap();
    let sealed = envelope.seal(b"profile secrets").unwrap();

    assert!(matches!(envelope.open(&sealed[..5]), Err(VaultError::InvalidPayload { .. })));
    assert!(matches!(
        envelope.open(&sealed[..sealed.len() - 1]),
        Err(VaultError::Decryption { .. })
    ));
}

#[test]
fn test_managed_key_survives_manager_instances() {
    let store = MemoryKeyring::new();
    let sealed = {
        let keys = KeyManager::new(Arc::new(store.clone()));
        let key = keys.get_or_create("urn.osprofiles.app.profile.v1", "default").unwrap();
        Envelope::<Aes>::new(&key).unwrap().seal(b"persisted").unwrap()
    };

    let keys = KeyManager::new(Arc::new(store));
    let key = keys.get_or_create("urn.osprofiles.app.profile.v1", "default").unwrap();
    assert_eq!(Envelope::<Aes>::new(&key).unwrap().open(&sealed).unwrap(), b"persisted");
}
