//! Encrypting messages for a receiver (RSA, PKCS#1 v1.5)

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::rand_core::CryptoRngCore;
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};

const PKCS1_V15_OVERHEAD: usize = 11;

/// Parse a public key: `BEGIN RSA PUBLIC KEY` (PKCS#1) or `BEGIN PUBLIC KEY` (SPKI)
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey, Box<dyn std::error::Error>> {
    let pem = pem.trim();
    match RsaPublicKey::from_pkcs1_pem(pem) {
        Ok(key) => Ok(key),
        Err(_) => Ok(RsaPublicKey::from_public_key_pem(pem)?),
    }
}

pub fn load_public_key(path: &str) -> Result<RsaPublicKey, Box<dyn std::error::Error>> {
    let pem = std::fs::read_to_string(path)?;
    parse_public_key(&pem)
}

/// Longest message that fits in one ciphertext for this key
pub fn max_message_len(key: &RsaPublicKey) -> usize {
    key.size().saturating_sub(PKCS1_V15_OVERHEAD)
}

/// Encrypt `message`; the result is exactly the key's modulus size
pub fn seal<R: CryptoRngCore>(
    key: &RsaPublicKey,
    message: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let max = max_message_len(key);
    if message.len() > max {
        return Err(format!("message is {} bytes, key allows at most {}", message.len(), max).into());
    }
    Ok(key.encrypt(rng, Pkcs1v15Encrypt, message)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sealink_mcu::{CryptoEngine, PrivateKey};

    const PUB_PKCS1: &str = include_str!("../../sealink-mcu/tests/data/device_pub_pkcs1.pem");
    const PUB_SPKI: &str = include_str!("../../sealink-mcu/tests/data/device_pub_spki.pem");
    const DEVICE_KEY: &str = include_str!("../../sealink-mcu/tests/data/device_key_pkcs1.pem");

    #[test]
    fn both_public_key_encodings_parse_to_same_key() {
        let a = parse_public_key(PUB_PKCS1).unwrap();
        let b = parse_public_key(PUB_SPKI).unwrap();
        assert_eq!(a, b);
        assert_eq!(max_message_len(&a), 245);
    }

    #[test]
    fn receiver_opens_what_sender_seals() {
        let public = parse_public_key(PUB_SPKI).unwrap();
        let ciphertext = seal(&public, "こんにちは".as_bytes(), &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(ciphertext.len(), 256);

        let key = PrivateKey::from_blob(DEVICE_KEY.as_bytes()).unwrap();
        let mut engine = CryptoEngine::new(Some(key), StdRng::seed_from_u64(6));
        assert_eq!(engine.decrypt(&ciphertext).unwrap(), "こんにちは".as_bytes());
    }

    #[test]
    fn oversized_message_is_refused() {
        let public = parse_public_key(PUB_PKCS1).unwrap();
        let err = seal(&public, &[b'x'; 246], &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(err.to_string().contains("at most 245"));
    }

    #[test]
    fn private_key_is_not_a_public_key() {
        assert!(parse_public_key(DEVICE_KEY).is_err());
    }
}
