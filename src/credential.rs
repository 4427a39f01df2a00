use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Result, ScripterError};

/// Environment variable that overrides the stored key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    api_key: String,
}

/// Single persisted slot holding the API key between sessions
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `.veo-scripter/credential.toml` under the working directory
    pub fn default_location() -> PathBuf {
        PathBuf::from(".veo-scripter").join("credential.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!("No stored credential at {}", self.path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| ScripterError::Credential(format!("Failed to read credential: {}", e)))?;
        let stored: StoredCredential = toml::from_str(&content)
            .map_err(|e| ScripterError::Credential(format!("Failed to parse credential: {}", e)))?;

        let key = stored.api_key.trim().to_string();
        Ok((!key.is_empty()).then_some(key))
    }

    pub fn save(&self, api_key: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string(&StoredCredential {
            api_key: api_key.trim().to_string(),
        })
        .map_err(|e| ScripterError::Credential(format!("Failed to serialize credential: {}", e)))?;
        fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        info!("Saved API key to {}", self.path.display());
        Ok(())
    }

    /// Remove the stored key; returns whether one existed
    pub fn clear(&self) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)?;
        info!("Removed stored API key {}", self.path.display());
        Ok(true)
    }
}

/// Startup lookup: the environment wins over the stored slot
pub fn resolve_startup_key(store: &CredentialStore) -> Result<Option<String>> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        let key = key.trim().to_string();
        if !key.is_empty() {
            debug!("Using API key from {}", API_KEY_ENV);
            return Ok(Some(key));
        }
    }
    store.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("credential.toml"));

        assert_eq!(store.load().unwrap(), None);
        assert_ok!(store.save("  secret-key \n"));
        assert_eq!(store.load().unwrap().as_deref(), Some("secret-key"));

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_blank_stored_key_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credential.toml");
        fs::write(&path, "api_key = \"  \"\n").unwrap();

        assert_eq!(CredentialStore::new(&path).load().unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_credential_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credential.toml");
        fs::write(&path, "not toml at all [").unwrap();

        let result = CredentialStore::new(&path).load();
        assert_err!(&result);
        assert!(matches!(result, Err(ScripterError::Credential(_))));
    }
}
