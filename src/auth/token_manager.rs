use chrono::Utc;
use log::{debug, info, warn};

use crate::auth::oauth::{self, Tokens};
use crate::auth::{TokenProvider, token_store, tokens_file};
use crate::config::AuthConfig;
use crate::error::Result;

/// Cached tokens are treated as expired this many seconds early.
const EXPIRY_SKEW_SECS: i64 = 60;
/// Assumed lifetime when the server omits `expires_in`.
const DEFAULT_LIFETIME_SECS: i64 = 3500;

/// Interactive token acquisition for a public client.
#[derive(Debug, Clone)]
pub struct TokenManager {
    auth: AuthConfig,
}

impl TokenManager {
    pub fn new(auth: AuthConfig) -> Self {
        Self { auth }
    }

    fn cached(&self, scopes: &[String], now: i64) -> Option<String> {
        let path = tokens_file::tokens_path().ok()?;
        let tf = match tokens_file::load_tokens_from(&path) {
            Ok(tf) => tf?,
            Err(e) => {
                warn!("{e}");
                return None;
            }
        };
        if tf.is_valid_for(&self.auth, scopes, now, EXPIRY_SKEW_SECS) {
            tf.access_token
        } else {
            None
        }
    }

    fn refreshed(&self, scopes: &[String]) -> Option<Tokens> {
        let rt = match token_store::load_refresh_token(&self.auth.client_id, &self.auth.tenant) {
            Ok(rt) => rt?,
            Err(e) => {
                warn!("{e}");
                return None;
            }
        };
        match oauth::refresh_access_token(&self.auth, scopes, &rt) {
            Ok(t) => Some(t),
            Err(e) => {
                info!("silent sign-in failed, falling back to device code: {e}");
                logged(token_store::delete_refresh_token(&self.auth.client_id, &self.auth.tenant));
                None
            }
        }
    }

    /// Persistence failures are logged; the token is still usable for this run.
    fn remember(&self, scopes: &[String], tokens: &Tokens, now: i64) {
        if let Some(rt) = tokens.refresh_token.as_deref() {
            logged(token_store::save_refresh_token(&self.auth.client_id, &self.auth.tenant, rt));
        }
        let exp = tokens
            .expires_in
            .map(|s| now + s as i64)
            .unwrap_or(now + DEFAULT_LIFETIME_SECS);
        let tf = tokens_file::TokensFile {
            client_id: self.auth.client_id.clone(),
            tenant: self.auth.tenant.clone(),
            scopes: scopes.to_vec(),
            access_token: Some(tokens.access_token.clone()),
            expires_at_epoch: Some(exp),
        };
        logged(tokens_file::tokens_path().and_then(|p| tokens_file::save_tokens_to(&p, &tf)));
    }
}

/// Token persistence is best-effort: a failure is logged and the run goes on.
fn logged(result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("{e}");
            false
        }
    }
}

impl TokenProvider for TokenManager {
    /// Returns a valid access token; refreshes or runs the device flow if needed.
    fn acquire(&self, scopes: &[String]) -> Result<String> {
        let now = Utc::now().timestamp();

        // 1) cached & not expired
        if let Some(at) = self.cached(scopes, now) {
            debug!("using cached access token");
            return Ok(at);
        }

        // 2) refresh if possible, 3) otherwise device code
        let tokens = match self.refreshed(scopes) {
            Some(t) => t,
            None => oauth::perform_device_flow(&self.auth, scopes)?,
        };
        self.remember(scopes, &tokens, now);
        Ok(tokens.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_persistence_failures_are_reported_not_raised() {
        assert!(logged(Ok(())));
        assert!(!logged(Err(Error::auth("cannot delete refresh token: no keyring"))));
    }
}
