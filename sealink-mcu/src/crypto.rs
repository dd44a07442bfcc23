//! RSA decryption of inbound payloads
//!
//! PKCS#1 v1.5 padding, device-wide. The blinding RNG is seeded once from
//! system entropy when the engine is built and reused for every call.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rsa::rand_core::CryptoRngCore;
use rsa::Pkcs1v15Encrypt;

use crate::error::CryptoError;
use crate::keystore::PrivateKey;

/// Decrypt one ciphertext with `key`
///
/// Never returns partial plaintext: any padding or range problem is
/// reported as [`CryptoError::PaddingOrFormatInvalid`].
pub fn decrypt<R: CryptoRngCore>(
    key: &PrivateKey,
    rng: &mut R,
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let max = key.size();
    if ciphertext.len() > max {
        return Err(CryptoError::OversizedInput {
            len: ciphertext.len(),
            max,
        });
    }
    if ciphertext.is_empty() {
        return Err(CryptoError::PaddingOrFormatInvalid);
    }

    key.rsa()
        .decrypt_blinded(rng, Pkcs1v15Encrypt, ciphertext)
        .map_err(|_| CryptoError::PaddingOrFormatInvalid)
}

/// The loaded key (if any) plus its blinding RNG
pub struct CryptoEngine {
    key: Option<PrivateKey>,
    rng: StdRng,
}

impl CryptoEngine {
    pub fn new(key: Option<PrivateKey>, rng: StdRng) -> Self {
        Self { key, rng }
    }

    /// Seed the RNG from system entropy
    pub fn from_entropy(key: Option<PrivateKey>) -> Self {
        Self::new(key, StdRng::from_entropy())
    }

    /// Engine with no key: decryption disabled
    pub fn disabled() -> Self {
        Self::from_entropy(None)
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    pub fn key(&self) -> Option<&PrivateKey> {
        self.key.as_ref()
    }

    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.key.as_ref().ok_or(CryptoError::KeyUnavailable)?;
        decrypt(key, &mut self.rng, ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::RsaPublicKey;

    const DEVICE_KEY: &str = include_str!("../tests/data/device_key_pkcs1.pem");
    const OTHER_KEY: &str = include_str!("../tests/data/other_key_pkcs1.pem");

    fn engine() -> CryptoEngine {
        let key = PrivateKey::from_blob(DEVICE_KEY.as_bytes()).unwrap();
        CryptoEngine::new(Some(key), StdRng::seed_from_u64(1))
    }

    fn encrypt(public: &RsaPublicKey, seed: u64, plaintext: &[u8]) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        public.encrypt(&mut rng, Pkcs1v15Encrypt, plaintext).unwrap()
    }

    #[test]
    fn round_trip_up_to_max_plaintext() {
        let mut engine = engine();
        let public = engine.key().unwrap().public_key();
        let max = engine.key().unwrap().max_plaintext_len();

        for (seed, len) in [(1u64, 1usize), (2, 2), (3, 32), (4, 200), (5, max)] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i * 7 + 3) as u8).collect();
            let ciphertext = encrypt(&public, seed, &plaintext);
            assert_eq!(ciphertext.len(), 256);
            assert_eq!(engine.decrypt(&ciphertext).unwrap(), plaintext);
        }
    }

    #[test]
    fn same_rng_serves_many_calls() {
        let mut engine = engine();
        let public = engine.key().unwrap().public_key();
        for seed in 0..4 {
            let ciphertext = encrypt(&public, seed, b"again");
            assert_eq!(engine.decrypt(&ciphertext).unwrap(), b"again");
        }
    }

    #[test]
    fn foreign_ciphertext_is_rejected() {
        let mut engine = engine();
        let other = PrivateKey::from_blob(OTHER_KEY.as_bytes()).unwrap().public_key();
        for seed in 10..14 {
            let ciphertext = encrypt(&other, seed, b"not for you");
            assert_eq!(
                engine.decrypt(&ciphertext),
                Err(CryptoError::PaddingOrFormatInvalid)
            );
        }
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let mut engine = engine();
        let public = engine.key().unwrap().public_key();
        let mut ciphertext = encrypt(&public, 7, b"integrity");
        ciphertext[128] ^= 0x01;
        assert_eq!(
            engine.decrypt(&ciphertext),
            Err(CryptoError::PaddingOrFormatInvalid)
        );
    }

    #[test]
    fn oversized_input_is_rejected_before_decrypt() {
        let mut engine = engine();
        assert_eq!(
            engine.decrypt(&[0xab; 257]),
            Err(CryptoError::OversizedInput { len: 257, max: 256 })
        );
    }

    #[test]
    fn plain_text_is_not_a_ciphertext() {
        let mut engine = engine();
        assert_eq!(
            engine.decrypt(b"hello"),
            Err(CryptoError::PaddingOrFormatInvalid)
        );
        assert_eq!(engine.decrypt(b""), Err(CryptoError::PaddingOrFormatInvalid));
    }

    #[test]
    fn disabled_engine_has_no_key() {
        let mut engine = CryptoEngine::disabled();
        assert!(!engine.is_enabled());
        assert_eq!(engine.decrypt(&[1; 256]), Err(CryptoError::KeyUnavailable));
    }
}
