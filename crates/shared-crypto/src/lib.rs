//! # Shared Crypto - Device Token Cryptography
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `asymmetric` | RSA-OAEP / SHA-512 | Encrypted device descriptors |
//! | `keys` | PKCS#8, PKCS#1 PEM | Private key loading |
//!
//! ## Security Properties
//!
//! - **OAEP**: randomized padding, ciphertexts are never reused across sends
//! - **Blinded decryption**: private-key operations use RSA blinding
//! - **Fixed algorithm**: one codec instance, one algorithm; mismatched
//!   descriptors are rejected before any private-key operation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asymmetric;
pub mod errors;
pub mod keys;

// Re-exports
pub use asymmetric::{AsymmetricCodec, RsaOaepCodec, RSA_OAEP_512};
pub use errors::{CryptoError, CryptoResult};
pub use keys::rsa_private_key_from_pem;
