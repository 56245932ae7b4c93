//! Login strategies.
//!
//! Every strategy turns credentials into a [`Session`]. Reports only ever see
//! the session, so the handshake can be swapped or stubbed independently.

mod cookie_file;
mod redirect;

pub use cookie_file::CookieFileLogin;
pub use redirect::RedirectLogin;

use crate::config::Config;
use crate::error::AuthError;
use crate::session::Session;
use async_trait::async_trait;
use std::fmt;

/// Username and password for the platform.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// A way of establishing an authenticated session.
#[async_trait]
pub trait LoginFlow: Send + Sync {
    /// Human-readable name for progress output.
    fn name(&self) -> &'static str;

    /// Runs the flow to completion or fails without retrying.
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError>;
}

/// Picks the login flow the configuration asks for.
pub fn flow_for_config(config: &Config) -> Box<dyn LoginFlow> {
    match &config.account.cookie_file {
        Some(path) => Box::new(CookieFileLogin::new(path.clone(), &config.site.user_agent)),
        None => Box::new(RedirectLogin::new(config.base_url(), &config.site.user_agent)),
    }
}
