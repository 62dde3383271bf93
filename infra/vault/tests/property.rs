use osprofiles_vault::prelude::*;
use osprofiles_vault::{NONCE_LEN, TAG_LEN};
use proptest::prelude::*;

proptest! {
    #[test]
    fn roundtrip_arbitrary_bytes_across_ciphers(data in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let key = EncryptionKey::generate().unwrap();

        let aes = Envelope::<Aes>::new(&key).unwrap();
        let sealed = aes.seal(&data).unwrap();
        prop_assert_eq!(sealed.len(), NONCE_LEN + data.len() + TAG_LEN);
        prop_assert_eq!(&aes.open(&sealed).unwrap(), &data);

        let chacha = Envelope::<ChaCha>::new(&key).unwrap();
        let sealed = chacha.seal(&data).unwrap();
        prop_assert_eq!(chacha.open(&sealed).unwrap(), data);
    }

    #[test]
    fn any_single_bit_flip_is_rejected(
        data in proptest::collection::vec(any::<u8>(), 1..256),
        position in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let envelope = Envelope::<Aes>::new(&EncryptionKey::generate().unwrap()).unwrap();
        let mut sealed = envelope.seal(&data).unwrap();
        let index = position.index(sealed.len());
        sealed[index] ^= 1 << bit;

        prop_assert!(
            matches!(envelope.open(&sealed), Err(VaultError::Decryption { .. })),
            "tampered ciphertext must fail with VaultError::Decryption"
        );
    }
}
