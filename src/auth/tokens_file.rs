use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{AuthConfig, config_dir};
use crate::error::{Error, Result};

/// Non-secret access-token cache stored in <config dir>/mail_date_report/tokens.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokensFile {
    pub client_id: String,
    pub tenant: String,
    pub scopes: Vec<String>,
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

impl TokensFile {
    /// Cached token usable for this app, tenant and scope set for at least `skew_secs` more.
    pub fn is_valid_for(&self, auth: &AuthConfig, scopes: &[String], now: i64, skew_secs: i64) -> bool {
        self.client_id == auth.client_id
            && self.tenant == auth.tenant
            && self.scopes == scopes
            && self.access_token.is_some()
            && self.expires_at_epoch.is_some_and(|exp| now + skew_secs < exp)
    }
}

pub fn tokens_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("tokens.json"))
}

pub fn save_tokens_to(path: &Path, tf: &TokensFile) -> Result<()> {
    let s = serde_json::to_string_pretty(tf)
        .map_err(|e| Error::auth(format!("cannot encode token cache: {e}")))?;
    fs::write(path, s)
        .map_err(|e| Error::auth(format!("cannot write {}: {e}", path.display())))
}

/// Load the cache if present. A corrupt file counts as absent.
pub fn load_tokens_from(path: &Path) -> Result<Option<TokensFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path)
        .map_err(|e| Error::auth(format!("cannot read {}: {e}", path.display())))?;
    match serde_json::from_str(&s) {
        Ok(tf) => Ok(Some(tf)),
        Err(e) => {
            log::warn!("ignoring unreadable token cache {}: {e}", path.display());
            Ok(None)
        }
    }
}
