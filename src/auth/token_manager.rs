use std::cell::RefCell;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::auth::oauth::{self, OAuthCredentials};
use crate::error::{Error, Result};

// Refresh this many seconds before the provider's stated expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

struct CachedToken {
    access_token: String,
    expires_at_epoch: i64,
}

/// Hands out access tokens for one credential, refreshing when the cached one lapses.
pub struct TokenManager {
    label: &'static str,
    creds: OAuthCredentials,
    cached: RefCell<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(label: &'static str, creds: OAuthCredentials) -> Self {
        Self {
            label,
            creds,
            cached: RefCell::new(None),
        }
    }

    /// Returns a valid access token; refreshes if needed.
    pub fn get_access_token(&self) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::Auth(e.to_string()))?
            .as_secs() as i64;

        if let Some(tok) = self.cached.borrow().as_ref()
            && now < tok.expires_at_epoch
        {
            return Ok(tok.access_token.clone());
        }

        debug!("refreshing {} access token", self.label);
        let t = oauth::refresh_access_token(&self.creds)?;
        let exp = t
            .expires_in
            .map(|s| now + s as i64 - EXPIRY_SKEW_SECS)
            .unwrap_or(now + 3500);
        *self.cached.borrow_mut() = Some(CachedToken {
            access_token: t.access_token.clone(),
            expires_at_epoch: exp,
        });
        Ok(t.access_token)
    }
}

/// Source of bearer tokens for the REST clients.
pub trait AccessTokenSource {
    fn access_token(&self) -> Result<String>;
}

impl AccessTokenSource for TokenManager {
    fn access_token(&self) -> Result<String> {
        self.get_access_token()
    }
}
