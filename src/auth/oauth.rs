use oauth2::TokenResponse;
use oauth2::basic::BasicClient;
use oauth2::reqwest::http_client;
use oauth2::{AuthUrl, ClientId, ClientSecret, RefreshToken, TokenUrl};
use serde::Deserialize;

use crate::error::{Error, Result};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Authorized-user credentials, as issued by the provisioning flow.
#[derive(Clone, Deserialize)]
pub struct OAuthCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub refresh_token: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl OAuthCredentials {
    /// Parses the JSON blob held in a credential setting.
    pub fn from_json(setting: &'static str, raw: &str) -> Result<Self> {
        let creds: OAuthCredentials = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("{setting} is not valid credential JSON: {e}")))?;
        if creds.refresh_token.trim().is_empty() {
            return Err(Error::Config(format!("{setting} has an empty refresh_token")));
        }
        Ok(creds)
    }
}

// Keep secrets out of debug output.
impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

/// Tokens returned by the refresh exchange (in-memory)
pub struct Tokens {
    pub access_token: String,
    pub expires_in: Option<u64>,
}

/// Exchange a refresh token for a new access token using the oauth2 crate
pub fn refresh_access_token(creds: &OAuthCredentials) -> Result<Tokens> {
    let client_id = ClientId::new(creds.client_id.clone());
    let client_secret = creds.client_secret.clone().map(ClientSecret::new);

    let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
        .map_err(|e| Error::Config(format!("bad auth url: {e}")))?;
    let token_url = TokenUrl::new(
        creds
            .token_uri
            .clone()
            .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
    )
    .map_err(|e| Error::Config(format!("bad token_uri: {e}")))?;

    let oauth_client = BasicClient::new(client_id, client_secret, auth_url, Some(token_url));

    let rt = RefreshToken::new(creds.refresh_token.clone());
    let token = oauth_client
        .exchange_refresh_token(&rt)
        .request(http_client)
        .map_err(|e| Error::Auth(format!("refresh token exchange failed: {e}")))?;

    Ok(Tokens {
        access_token: token.access_token().secret().to_string(),
        expires_in: token.expires_in().map(|d| d.as_secs()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authorized_user_json() {
        let raw = r#"{"client_id":"cid.apps.googleusercontent.com","client_secret":"sec","refresh_token":"1//rt","type":"authorized_user"}"#;
        let creds = OAuthCredentials::from_json("GMAIL_REFRESH_TOKEN", raw).unwrap();
        assert_eq!(creds.client_id, "cid.apps.googleusercontent.com");
        assert_eq!(creds.client_secret.as_deref(), Some("sec"));
        assert!(creds.token_uri.is_none());
    }

    #[test]
    fn garbage_is_a_config_error() {
        let err = OAuthCredentials::from_json("GMAIL_REFRESH_TOKEN", "not json").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("GMAIL_REFRESH_TOKEN"));
    }

    #[test]
    fn blank_refresh_token_is_a_config_error() {
        let raw = r#"{"client_id":"cid","refresh_token":"  "}"#;
        let err = OAuthCredentials::from_json("GOOGLE_DRIVE_REFRESH_TOKEN", raw).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn debug_hides_secrets() {
        let raw = r#"{"client_id":"cid","client_secret":"topsecret","refresh_token":"rt-secret"}"#;
        let creds = OAuthCredentials::from_json("X", raw).unwrap();
        let shown = format!("{creds:?}");
        assert!(!shown.contains("topsecret"));
        assert!(!shown.contains("rt-secret"));
    }
}
