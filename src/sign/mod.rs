//! Module signing.
//!
//! Signing binds a signature to a module's serialized content so the host
//! application can verify provenance before loading it. The primitive is
//! kept behind the [`Signer`] trait; the shipped implementation is Ed25519
//! with the private key read from a file.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};

/// The opaque signing capability.
pub trait Signer {
    /// Sign the payload, returning the signature hex-encoded.
    fn sign(&self, payload: &[u8]) -> Result<String>;

    /// Hex-encoded public key identifying the signer.
    fn key_id(&self) -> String;
}

/// Ed25519 signer backed by a private key file.
///
/// The key file holds the 32-byte seed, either raw or hex-encoded.
pub struct KeyFileSigner {
    key: SigningKey,
}

impl KeyFileSigner {
    /// Load the private key from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("failed to read key file: {}", path.display()))?;

        let seed: [u8; 32] = if bytes.len() == 32 {
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| anyhow!("key file {} is not 32 bytes", path.display()))?
        } else {
            let text = String::from_utf8_lossy(&bytes);
            let decoded = hex::decode(text.trim()).with_context(|| {
                format!(
                    "key file {} holds neither 32 raw bytes nor a hex-encoded seed",
                    path.display()
                )
            })?;
            decoded.as_slice().try_into().map_err(|_| {
                anyhow!(
                    "key file {} decodes to {} bytes, expected 32",
                    path.display(),
                    decoded.len()
                )
            })?
        };

        Ok(KeyFileSigner {
            key: SigningKey::from_bytes(&seed),
        })
    }
}

impl Signer for KeyFileSigner {
    fn sign(&self, payload: &[u8]) -> Result<String> {
        Ok(hex::encode(self.key.sign(payload).to_bytes()))
    }

    fn key_id(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }
}

/// Verify a hex-encoded signature against a hex-encoded public key.
pub fn verify(key_id: &str, payload: &[u8], signature: &str) -> Result<bool> {
    let key_bytes: [u8; 32] = hex::decode(key_id)
        .context("invalid public key hex")?
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("public key is not 32 bytes"))?;
    let key = VerifyingKey::from_bytes(&key_bytes).context("invalid Ed25519 public key")?;

    let sig_bytes: [u8; 64] = hex::decode(signature)
        .context("invalid signature hex")?
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("signature is not 64 bytes"))?;

    Ok(key.verify(payload, &Signature::from_bytes(&sig_bytes)).is_ok())
}
