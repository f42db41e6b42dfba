//! Encrypted sensitive variable files.
//!
//! Sensitive variables travel between pipeline steps in a sealed container
//! rather than plain JSON. The on-disk layout is:
//!
//! ```text
//! magic (8 bytes) | salt (16 bytes) | nonce (12 bytes) | ciphertext + tag
//! ```
//!
//! The encryption key is derived from the supplied password with Argon2id
//! (random per-file salt), and the payload is the same flat JSON object used
//! by plain variable files, sealed with AES-256-GCM. The GCM tag covers the
//! whole payload, so a wrong password and a tampered file are
//! indistinguishable and both rejected.

use crate::error::{CapstanError, Result};
use crate::variables::output::write_atomic;
use crate::variables::{VariableStore, parse_variables_json};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use argon2::Argon2;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use std::path::Path;

const MAGIC: &[u8; 8] = b"CAPSTAN\x01";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + NONCE_LEN;

/// Decrypt a sensitive variables file into a store.
pub fn load(path: &Path, password: &str) -> Result<VariableStore> {
    let bytes = std::fs::read(path).map_err(|e| {
        CapstanError::Decryption(format!("failed to read '{}': {}", path.display(), e))
    })?;

    if bytes.len() < HEADER_LEN + TAG_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(CapstanError::Decryption(format!(
            "'{}' is not a sensitive variables file",
            path.display()
        )));
    }

    let salt = &bytes[MAGIC.len()..MAGIC.len() + SALT_LEN];
    let nonce = &bytes[MAGIC.len() + SALT_LEN..HEADER_LEN];
    let ciphertext = &bytes[HEADER_LEN..];

    let key = derive_key(password, salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| {
            CapstanError::Decryption("incorrect password or corrupted file".to_string())
        })?;

    let content = String::from_utf8(plaintext)
        .map_err(|_| CapstanError::Decryption("decrypted content is not UTF-8".to_string()))?;
    parse_variables_json(&content)
        .map_err(|detail| CapstanError::Decryption(format!("decrypted content: {}", detail)))
}

/// Encrypt a store to a sensitive variables file with a fresh salt and nonce.
pub fn encrypt_to_file(path: &Path, store: &VariableStore, password: &str) -> Result<()> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), store.to_json_string().as_bytes())
        .map_err(|_| CapstanError::Decryption("encryption failed".to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&salt);
    bytes.extend_from_slice(&nonce);
    bytes.extend_from_slice(&ciphertext);

    write_atomic(path, &bytes).map_err(|detail| CapstanError::SaveFailure {
        path: path.to_path_buf(),
        detail,
    })
}

fn derive_key(password: &str, salt: &[u8]) -> Result<[u8; KEY_LEN]> {
    let mut key = [0u8; KEY_LEN];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| CapstanError::Decryption(format!("key derivation failed: {}", e)))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_store() -> VariableStore {
        let mut store = VariableStore::new();
        store.set("Db.Password", "hunter2");
        store.set("Api.Token", "tok-123");
        store
    }

    #[test]
    fn encrypt_then_load_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sensitive.bin");

        encrypt_to_file(&path, &sample_store(), "passphrase").unwrap();
        let loaded = load(&path, "passphrase").unwrap();

        assert_eq!(loaded.get("Db.Password"), Some("hunter2"));
        assert_eq!(loaded.get("Api.Token"), Some("tok-123"));
        let keys: Vec<_> = loaded.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Db.Password", "Api.Token"]);
    }

    #[test]
    fn file_on_disk_is_not_plaintext() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sensitive.bin");

        encrypt_to_file(&path, &sample_store(), "passphrase").unwrap();
        let bytes = std::fs::read(&path).unwrap();

        assert_eq!(&bytes[..MAGIC.len()], MAGIC);
        let haystack = String::from_utf8_lossy(&bytes);
        assert!(!haystack.contains("hunter2"));
        assert!(!haystack.contains("Db.Password"));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sensitive.bin");

        encrypt_to_file(&path, &sample_store(), "correct").unwrap();
        let result = load(&path, "incorrect");
        assert!(matches!(result, Err(CapstanError::Decryption(_))));
    }

    #[test]
    fn tampered_ciphertext_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sensitive.bin");

        encrypt_to_file(&path, &sample_store(), "passphrase").unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        std::fs::write(&path, &bytes).unwrap();

        let result = load(&path, "passphrase");
        assert!(matches!(result, Err(CapstanError::Decryption(_))));
    }

    #[test]
    fn non_capstan_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plain.json");
        std::fs::write(&path, r#"{"NotEncrypted": "at all, but padded long enough"}"#).unwrap();

        let result = load(&path, "passphrase");
        assert!(matches!(result, Err(CapstanError::Decryption(_))));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("short.bin");
        std::fs::write(&path, MAGIC).unwrap();

        let result = load(&path, "passphrase");
        assert!(matches!(result, Err(CapstanError::Decryption(_))));
    }

    #[test]
    fn missing_file_is_a_decryption_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = load(&temp_dir.path().join("absent.bin"), "passphrase");
        assert!(matches!(result, Err(CapstanError::Decryption(_))));
    }

    #[test]
    fn empty_store_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.bin");

        encrypt_to_file(&path, &VariableStore::new(), "passphrase").unwrap();
        let loaded = load(&path, "passphrase").unwrap();
        assert!(loaded.is_empty());
    }
}
