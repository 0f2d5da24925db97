pub mod oauth;
pub mod token_manager;
pub mod token_store;
pub mod tokens_file;

use crate::error::Result;

/// Source of bearer tokens for the mail API.
pub trait TokenProvider {
    fn acquire(&self, scopes: &[String]) -> Result<String>;
}

/// A token obtained elsewhere (e.g. `--access-token`).
#[derive(Clone)]
pub struct StaticToken(pub String);

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken([REDACTED])")
    }
}

impl TokenProvider for StaticToken {
    fn acquire(&self, _scopes: &[String]) -> Result<String> {
        Ok(self.0.clone())
    }
}
