use keyring::{Entry, Error as KeyringError};

use crate::error::{Error, Result};

const SERVICE: &str = env!("CARGO_PKG_NAME");

fn entry(client_id: &str, tenant: &str) -> Result<Entry> {
    Entry::new(SERVICE, &format!("{tenant}/{client_id}"))
        .map_err(|e| Error::auth(format!("keyring unavailable: {e}")))
}

/// Save a refresh token into the OS keyring for the given app registration
pub fn save_refresh_token(client_id: &str, tenant: &str, refresh_token: &str) -> Result<()> {
    entry(client_id, tenant)?
        .set_password(refresh_token)
        .map_err(|e| Error::auth(format!("cannot store refresh token: {e}")))
}

/// Load a refresh token from the keyring for the given app registration
pub fn load_refresh_token(client_id: &str, tenant: &str) -> Result<Option<String>> {
    match entry(client_id, tenant)?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(Error::auth(format!("cannot read refresh token: {e}"))),
    }
}

/// Forget a refresh token the server no longer accepts
pub fn delete_refresh_token(client_id: &str, tenant: &str) -> Result<()> {
    match entry(client_id, tenant)?.delete_credential() {
        Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
        Err(e) => Err(Error::auth(format!("cannot delete refresh token: {e}"))),
    }
}
