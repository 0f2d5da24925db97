use std::time::Duration;

use log::debug;
use oauth2::basic::BasicClient;
use oauth2::devicecode::StandardDeviceAuthorizationResponse;
use oauth2::reqwest::http_client;
use oauth2::{
    AuthType, AuthUrl, ClientId, DeviceAuthorizationUrl, RefreshToken, Scope, TokenResponse,
    TokenUrl,
};

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Give up on a device-code sign-in after this long.
const DEVICE_FLOW_TIMEOUT: Duration = Duration::from_secs(900);

/// Tokens returned by the oauth flow (in-memory)
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

fn oauth_client(auth: &AuthConfig) -> Result<BasicClient> {
    let authority = auth.authority();
    let auth_url = AuthUrl::new(format!("{authority}/oauth2/v2.0/authorize"))
        .map_err(|e| Error::config(format!("invalid authority: {e}")))?;
    let token_url = TokenUrl::new(format!("{authority}/oauth2/v2.0/token"))
        .map_err(|e| Error::config(format!("invalid authority: {e}")))?;
    let device_url = DeviceAuthorizationUrl::new(format!("{authority}/oauth2/v2.0/devicecode"))
        .map_err(|e| Error::config(format!("invalid authority: {e}")))?;

    // public client: no secret, client_id goes in the request body
    Ok(
        BasicClient::new(ClientId::new(auth.client_id.clone()), None, auth_url, Some(token_url))
            .set_device_authorization_url(device_url)
            .set_auth_type(AuthType::RequestBody),
    )
}

/// `offline_access` is always added so the server issues a refresh token.
fn scopes_with_offline(scopes: &[String]) -> Vec<Scope> {
    scopes
        .iter()
        .map(String::as_str)
        .chain(std::iter::once("offline_access"))
        .map(|s| Scope::new(s.to_string()))
        .collect()
}

fn tokens_from<T: TokenResponse<oauth2::basic::BasicTokenType>>(token: &T) -> Tokens {
    Tokens {
        access_token: token.access_token().secret().to_string(),
        refresh_token: token.refresh_token().map(|r| r.secret().to_string()),
        expires_in: token.expires_in().map(|d| d.as_secs()),
    }
}

/// Exchange a refresh token for a new access token.
pub fn refresh_access_token(auth: &AuthConfig, scopes: &[String], refresh_token: &str) -> Result<Tokens> {
    let client = oauth_client(auth)?;
    let rt = RefreshToken::new(refresh_token.to_string());
    let token = client
        .exchange_refresh_token(&rt)
        .add_scopes(scopes_with_offline(scopes))
        .request(http_client)
        .map_err(|e| Error::auth(format!("refresh failed: {e}")))?;
    Ok(tokens_from(&token))
}

/// Device authorization grant: print the code, let the user sign in on any
/// browser, poll until the server hands out a token.
pub fn perform_device_flow(auth: &AuthConfig, scopes: &[String]) -> Result<Tokens> {
    let client = oauth_client(auth)?;

    let details: StandardDeviceAuthorizationResponse = client
        .exchange_device_code()
        .map_err(|e| Error::config(format!("device flow not configured: {e}")))?
        .add_scopes(scopes_with_offline(scopes))
        .request(http_client)
        .map_err(|e| {
            Error::auth(format!(
                "failed to create device flow, check your CLIENT_ID and tenant: {e}"
            ))
        })?;

    let verification_uri = details.verification_uri().to_string();
    println!(
        "\n>>> Open {verification_uri} and enter code: {}",
        details.user_code().secret()
    );
    println!(">>> Waiting for sign-in...");
    // best-effort: the code is printed either way
    if let Err(e) = open::that(&verification_uri) {
        debug!("could not open browser automatically: {e}");
    }

    let token = client
        .exchange_device_access_token(&details)
        .request(http_client, std::thread::sleep, Some(DEVICE_FLOW_TIMEOUT))
        .map_err(|e| Error::auth(format!("token error: {e}")))?;

    Ok(tokens_from(&token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_access_is_appended() {
        let scopes = vec!["User.Read".to_string(), "Mail.Read".to_string()];
        let names: Vec<String> = scopes_with_offline(&scopes)
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["User.Read", "Mail.Read", "offline_access"]);
    }

    #[test]
    fn test_client_builds_for_tenant() {
        let auth = AuthConfig::new(Some("client"), Some("contoso.onmicrosoft.com")).unwrap();
        assert!(oauth_client(&auth).is_ok());
    }
}
