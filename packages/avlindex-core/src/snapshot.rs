//! Encrypted whole-tree snapshots.
//!
//! File layout: `nonce (12 bytes) || AES-256-GCM(serde_json(ordered elements))`.
//! A fresh nonce is drawn for every save; the key is supplied by the caller.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::avl::AvlCore;
use crate::error::{Error, Result};
use crate::traits::{AuditSink, SearchTree, Validator};
use crate::tree::GuardedTree;

pub const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

/// 256-bit snapshot encryption key.
#[derive(Clone, PartialEq, Eq)]
pub struct SnapshotKey([u8; KEY_LEN]);

impl SnapshotKey {
    /// The key older builds hardcoded for every snapshot. Publicly known, so anything
    /// saved under it is effectively plaintext; kept for demos and fixtures.
    pub const LEGACY_DEMO: SnapshotKey = SnapshotKey(*b"DoAnTotNghiep_MatKhauSieuBaoMat!");

    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parses 64 hex characters.
    pub fn from_hex(text: &str) -> Result<Self> {
        let raw = hex::decode(text.trim()).map_err(|e| Error::Crypto(format!("invalid key hex: {e}")))?;
        let bytes: [u8; KEY_LEN] = raw.try_into().map_err(|raw: Vec<u8>| {
            Error::Crypto(format!("key must be {KEY_LEN} bytes, got {}", raw.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Derives a key as the SHA-256 digest of `passphrase`.
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self(Sha256::digest(passphrase.as_bytes()).into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| Error::Crypto(format!("failed to create cipher: {e}")))
    }
}

impl fmt::Debug for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SnapshotKey(..)")
    }
}

/// Serializes and encrypts an ordered element list.
pub fn encode<T: Serialize>(elements: &[T], key: &SnapshotKey) -> Result<Vec<u8>> {
    let plaintext = serde_json::to_vec(elements).map_err(|e| Error::Codec(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let ciphertext = key
        .cipher()?
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
        .map_err(|e| Error::Crypto(format!("encryption failed: {e}")))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Inverse of [`encode`]. Fails on a wrong key or any tampering.
pub fn decode<T: DeserializeOwned>(bytes: &[u8], key: &SnapshotKey) -> Result<Vec<T>> {
    if bytes.len() < NONCE_LEN {
        return Err(Error::Crypto("snapshot too short".into()));
    }
    let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
    let plaintext = key
        .cipher()?
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| Error::Crypto(format!("decryption failed: {e}")))?;
    serde_json::from_slice(&plaintext).map_err(|e| Error::Codec(e.to_string()))
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl<T, V, A> GuardedTree<AvlCore<T>, V, A>
where
    T: Ord + Clone + fmt::Display + Serialize + DeserializeOwned,
    V: Validator<T>,
    A: AuditSink,
{
    /// Writes the current contents to `path`, replacing any previous snapshot only
    /// once the new one is fully written.
    pub fn save(&self, path: impl AsRef<Path>, key: &SnapshotKey) -> Result<()> {
        let path = path.as_ref();
        let bytes = {
            let core = self.core.read();
            let elements: Vec<&T> = core.iter().collect();
            encode(&elements, key)?
        };
        let staging = staging_path(path);
        if let Err(err) = fs::write(&staging, &bytes).and_then(|()| fs::rename(&staging, path)) {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "snapshot saved");
        Ok(())
    }

    /// Replaces the contents with the snapshot at `path`.
    ///
    /// Returns `Ok(false)` and leaves the tree alone if `path` does not exist. On any
    /// read, decryption, or decode failure the current contents are kept.
    pub fn load(&self, path: impl AsRef<Path>, key: &SnapshotKey) -> Result<bool> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(false);
        }
        let bytes = fs::read(path)?;
        let elements: Vec<T> = decode(&bytes, key)?;

        let mut rebuilt = AvlCore::with_capacity(elements.len());
        for element in elements {
            rebuilt.insert(element);
        }
        let count = rebuilt.len();
        *self.core.write() = rebuilt;
        tracing::debug!(path = %path.display(), elements = count, "snapshot loaded");
        Ok(true)
    }
}
