//! # Private Key Loading
//!
//! Accepts both PEM encodings RSA keys are commonly shipped in:
//!
//! | PEM label | Container |
//! |-----------|-----------|
//! | `PRIVATE KEY` | PKCS#8 `PrivateKeyInfo` (algorithm checked) |
//! | `RSA PRIVATE KEY` | PKCS#1 `RSAPrivateKey` |
//!
//! Anything else is rejected with `CryptoError::UnsupportedAlgorithm`, so a
//! codec can never be built from an EC or Ed25519 key by mistake.

use crate::{CryptoError, CryptoResult};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{PrivateKeyInfo, SecretDocument};
use rsa::RsaPrivateKey;

const PKCS8_LABEL: &str = "PRIVATE KEY";
const PKCS1_LABEL: &str = "RSA PRIVATE KEY";

/// Parse an RSA private key from PEM text.
///
/// # Errors
///
/// - `UnsupportedAlgorithm` for a non-RSA PKCS#8 key or an unknown PEM label
/// - `InvalidKey` for malformed PEM or DER
pub fn rsa_private_key_from_pem(pem: &str) -> CryptoResult<RsaPrivateKey> {
    let (label, document) = SecretDocument::from_pem(pem.trim())
        .map_err(|e| CryptoError::InvalidKey(format!("failed to decode PEM: {e}")))?;

    match label {
        PKCS8_LABEL => {
            let info = PrivateKeyInfo::try_from(document.as_bytes())
                .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;

            if info.algorithm.oid != rsa::pkcs1::ALGORITHM_OID {
                return Err(CryptoError::UnsupportedAlgorithm(format!(
                    "PKCS#8 key algorithm {}",
                    info.algorithm.oid
                )));
            }

            RsaPrivateKey::try_from(info).map_err(|e| CryptoError::InvalidKey(e.to_string()))
        }
        PKCS1_LABEL => RsaPrivateKey::from_pkcs1_der(document.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(e.to_string())),
        other => Err(CryptoError::UnsupportedAlgorithm(format!(
            "PEM label {other:?}"
        ))),
    }
}
