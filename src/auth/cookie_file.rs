//! Session from an exported browser cookie file.

use super::{Credentials, LoginFlow};
use crate::cookies::load_cookie_jar;
use crate::error::AuthError;
use crate::session::Session;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Skips the password handshake and reuses cookies from a Netscape file.
pub struct CookieFileLogin {
    path: PathBuf,
    user_agent: String,
}

impl CookieFileLogin {
    pub fn new(path: PathBuf, user_agent: &str) -> Self {
        Self {
            path,
            user_agent: user_agent.to_string(),
        }
    }
}

#[async_trait]
impl LoginFlow for CookieFileLogin {
    fn name(&self) -> &'static str {
        "cookie file"
    }

    async fn login(&self, _credentials: &Credentials) -> Result<Session, AuthError> {
        let (jar, loaded) = load_cookie_jar(&self.path)?;
        debug!(path = %self.path.display(), loaded, "loaded cookie file");
        Ok(Session::new(jar, &self.user_agent)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_login_from_cookie_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "zwiftpower.com\tFALSE\t/\tTRUE\t0\tsid\tabc\n").unwrap();

        let flow = CookieFileLogin::new(path, "agent");
        let session = flow.login(&Credentials::new("", "")).await;
        assert!(session.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_cookie_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "garbage").unwrap();

        let flow = CookieFileLogin::new(path, "agent");
        let err = flow.login(&Credentials::new("", "")).await.unwrap_err();
        assert!(matches!(err, AuthError::Cookies(_)));
    }
}
