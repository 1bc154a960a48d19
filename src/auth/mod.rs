pub mod oauth;
pub mod token_manager;

pub use oauth::OAuthCredentials;
pub use token_manager::{AccessTokenSource, TokenManager};
