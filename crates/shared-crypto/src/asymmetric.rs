//! # Asymmetric Device-Token Encryption
//!
//! Senders encrypt each device descriptor to the relay's public key; only the
//! relay, holding the private key, can recover the push key inside.
//!
//! ## Scheme
//!
//! RSA-OAEP with SHA-512 for both the label hash and MGF1. The padding is
//! fixed per codec instance: there is no per-call negotiation.
//!
//! ```text
//! max plaintext = k - 2 * hLen - 2      (k = modulus bytes, hLen = 64)
//! 2048-bit key  -> 126 bytes
//! 4096-bit key  -> 382 bytes
//! ```

use crate::keys::rsa_private_key_from_pem;
use crate::{CryptoError, CryptoResult};
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha512;

/// Algorithm identifier carried next to every encrypted device descriptor.
pub const RSA_OAEP_512: &str = "RSA-OAEP-512";

const SHA512_LEN: usize = 64;

/// Encrypt/decrypt contract used by the dispatcher.
///
/// Exactly one algorithm is active per instance; `alg()` names it so callers
/// can reject descriptors tagged for something else before decrypting.
pub trait AsymmetricCodec: Send + Sync {
    /// Encrypt `plaintext` to the codec's public key.
    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Decrypt `ciphertext` with the codec's private key.
    ///
    /// Never panics on attacker-controlled input.
    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Algorithm identifier, e.g. `"RSA-OAEP-512"`.
    fn alg(&self) -> &str;
}

/// RSA-OAEP-SHA512 codec.
#[derive(Clone)]
pub struct RsaOaepCodec {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl RsaOaepCodec {
    /// Build from an already parsed private key.
    pub fn from_private_key(private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// Build from PEM text (PKCS#8 or PKCS#1).
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` when the PEM holds a non-RSA key.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        rsa_private_key_from_pem(pem).map(Self::from_private_key)
    }

    /// Public key as an SPKI `PUBLIC KEY` PEM with LF line endings.
    pub fn public_key_pem(&self) -> CryptoResult<String> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::PemEncoding(e.to_string()))
    }

    /// Largest plaintext one OAEP block can carry for this key.
    pub fn max_plaintext_len(&self) -> usize {
        self.public_key.size().saturating_sub(2 * SHA512_LEN + 2)
    }
}

impl AsymmetricCodec for RsaOaepCodec {
    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        let max = self.max_plaintext_len();
        if plaintext.len() > max {
            return Err(CryptoError::MessageTooLong {
                max,
                actual: plaintext.len(),
            });
        }

        self.public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha512>(), plaintext)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        self.private_key
            .decrypt_blinded(&mut OsRng, Oaep::new::<Sha512>(), ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }

    fn alg(&self) -> &str {
        RSA_OAEP_512
    }
}

impl std::fmt::Debug for RsaOaepCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaOaepCodec")
            .field("alg", &RSA_OAEP_512)
            .field("key_bits", &(self.public_key.size() * 8))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::DecodePublicKey;
    use rsa::Pkcs1v15Encrypt;

    const RSA_PKCS8: &str = include_str!("../tests/fixtures/rsa_pkcs8.pem");
    const RSA_PUBLIC: &str = include_str!("../tests/fixtures/rsa_public.pem");
    const RSA_OTHER: &str = include_str!("../tests/fixtures/rsa_other_pkcs8.pem");

    fn codec() -> RsaOaepCodec {
        RsaOaepCodec::from_pem(RSA_PKCS8).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let codec = codec();
        let plaintext = br#"{"app_id":"local.id","pushkey":"kA"}"#;

        let ciphertext = codec.encrypt(plaintext).unwrap();
        let decrypted = codec.decrypt(&ciphertext).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_roundtrip_from_empty_to_max() {
        let codec = codec();
        let max = codec.max_plaintext_len();
        assert_eq!(max, 126);

        for len in [0, 1, max / 2, max] {
            let plaintext = vec![0xA5u8; len];
            let ciphertext = codec.encrypt(&plaintext).unwrap();
            assert_eq!(codec.decrypt(&ciphertext).unwrap(), plaintext, "len {len}");
        }
    }

    #[test]
    fn test_oversized_plaintext_rejected() {
        let codec = codec();
        let plaintext = vec![0u8; codec.max_plaintext_len() + 1];

        let result = codec.encrypt(&plaintext);
        assert!(matches!(
            result,
            Err(CryptoError::MessageTooLong { max: 126, actual: 127 })
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let codec1 = codec();
        let codec2 = RsaOaepCodec::from_pem(RSA_OTHER).unwrap();

        let ciphertext = codec1.encrypt(b"Secret message").unwrap();
        let result = codec2.decrypt(&ciphertext);

        assert!(matches!(result, Err(CryptoError::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let codec = codec();

        let mut ciphertext = codec.encrypt(b"Secret message").unwrap();
        ciphertext[10] ^= 0xFF;

        assert!(codec.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn test_garbage_input_does_not_panic() {
        let codec = codec();

        assert!(codec.decrypt(&[]).is_err());
        assert!(codec.decrypt(b"mockedInvalidCipherText").is_err());
        assert!(codec.decrypt(&[0xFF; 512]).is_err());
    }

    #[test]
    fn test_pkcs1v15_ciphertext_rejected() {
        let codec = codec();
        let public = RsaPublicKey::from_public_key_pem(RSA_PUBLIC).unwrap();

        let ciphertext = public
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, b"wrong padding")
            .unwrap();

        assert!(codec.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn test_public_key_pem_matches_private_key() {
        let codec = codec();
        let pem = codec.public_key_pem().unwrap();

        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
        assert!(!pem.contains('\r'));

        let exported = RsaPublicKey::from_public_key_pem(&pem).unwrap();
        let expected = RsaPublicKey::from_public_key_pem(RSA_PUBLIC).unwrap();
        assert_eq!(exported, expected);
    }

    #[test]
    fn test_alg_identifier() {
        assert_eq!(codec().alg(), "RSA-OAEP-512");
    }
}
