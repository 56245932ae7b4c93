//! Password login through the site's SSO redirect chain.

use super::{Credentials, LoginFlow};
use crate::error::AuthError;
use crate::session::{Session, create_http_client};
use async_trait::async_trait;
use reqwest::Response;
use reqwest::cookie::Jar;
use reqwest::header::LOCATION;
use scraper::{Html, Selector};
use std::sync::{Arc, LazyLock};
use tracing::debug;
use url::Url;

/// Path and query that start the external login.
const LOGIN_PATH: &str = "/ucp.php?mode=login&login=external&oauth_service=oauthzpsso";

/// The SSO page's login form.
static FORM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("#form").unwrap());

/// Runs the five-step redirect handshake:
///
/// 1. GET the login redirect URL without following it
/// 2. GET its `Location` to obtain the login form page
/// 3. read the form's `action`
/// 4. POST the credentials there without following the answer
/// 5. GET the final `Location`, following redirects, to settle the session
pub struct RedirectLogin {
    base_url: String,
    user_agent: String,
}

impl RedirectLogin {
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    fn login_url(&self) -> String {
        format!("{}{}", self.base_url, LOGIN_PATH)
    }
}

/// Resolves the `Location` header of a redirect response.
fn redirect_target(response: &Response) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    response.url().join(location).ok()
}

/// Finds the login form's submission URL in the page.
fn form_action(html: &str, page_url: &Url) -> Result<Url, AuthError> {
    let doc = Html::parse_document(html);
    let action = doc
        .select(&FORM_SELECTOR)
        .next()
        .and_then(|form| form.value().attr("action"))
        .ok_or_else(|| AuthError::FormNotFound {
            url: page_url.to_string(),
        })?;

    page_url
        .join(action)
        .map_err(|e| AuthError::InvalidUrl(format!("{}: {}", action, e)))
}

#[async_trait]
impl LoginFlow for RedirectLogin {
    fn name(&self) -> &'static str {
        "password login"
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let jar = Arc::new(Jar::default());
        let handshake = create_http_client(jar.clone(), &self.user_agent, false)?;

        let login_url = self.login_url();
        let response = handshake.get(&login_url).send().await?;
        let sso_url =
            redirect_target(&response).ok_or(AuthError::MissingRedirect { url: login_url })?;
        debug!(%sso_url, "login redirect");

        let response = handshake.get(sso_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(AuthError::Rejected {
                status: response.status().as_u16(),
                url: sso_url.to_string(),
            });
        }
        let page_url = response.url().clone();
        let page = response.text().await?;
        let action = form_action(&page, &page_url)?;
        debug!(%action, "submitting login form");

        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("rememberMe", "on"),
        ];
        let response = handshake.post(action.clone()).form(&form).send().await?;
        let landing = redirect_target(&response).ok_or_else(|| AuthError::Rejected {
            status: response.status().as_u16(),
            url: action.to_string(),
        })?;

        let session = Session::new(jar, &self.user_agent)?;
        let response = session.client().get(landing.clone()).send().await?;
        if !response.status().is_success() {
            return Err(AuthError::Rejected {
                status: response.status().as_u16(),
                url: landing.to_string(),
            });
        }
        debug!(final_url = %response.url(), "login complete");

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn creds() -> Credentials {
        Credentials::new("rider@example.com", "secret")
    }

    async fn mount_redirect_start(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/ucp.php"))
            .and(query_param("mode", "login"))
            .and(query_param("oauth_service", "oauthzpsso"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "/sso/auth")
                    .insert_header("Set-Cookie", "start=1; Path=/"),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_form_action_relative() {
        let page = Url::parse("https://secure.example.com/auth/login").unwrap();
        let html = r#"<html><body><form id="form" action="/auth/submit?session=a&amp;b=c"></form></body></html>"#;
        let action = form_action(html, &page).unwrap();
        assert_eq!(action.as_str(), "https://secure.example.com/auth/submit?session=a&b=c");
    }

    #[test]
    fn test_form_action_missing() {
        let page = Url::parse("https://secure.example.com/").unwrap();
        let err = form_action("<form id=\"other\"></form>", &page).unwrap_err();
        assert!(matches!(err, AuthError::FormNotFound { .. }));
    }

    #[tokio::test]
    async fn test_full_handshake_keeps_cookies() {
        let server = MockServer::start().await;
        mount_redirect_start(&server).await;

        Mock::given(method("GET"))
            .and(path("/sso/auth"))
            .and(header("cookie", "start=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><form id="form" action="/sso/submit" method="post"></form></html>"#,
            ))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/sso/submit"))
            .and(body_string_contains("username=rider%40example.com"))
            .and(body_string_contains("rememberMe=on"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "/done")
                    .insert_header("Set-Cookie", "auth=ok; Path=/"),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/done"))
            .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/private.json"))
            .and(|req: &wiremock::Request| {
                req.headers
                    .get("cookie")
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|c| c.contains("start=1") && c.contains("auth=ok"))
            })
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":[]}"#))
            .mount(&server)
            .await;

        let flow = RedirectLogin::new(&server.uri(), "agent");
        let session = flow.login(&creds()).await.unwrap();

        let value = session
            .get_json_value(&format!("{}/private.json", server.uri()))
            .await
            .unwrap();
        assert!(value["data"].is_array());
    }

    #[tokio::test]
    async fn test_missing_first_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ucp.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("no redirect"))
            .mount(&server)
            .await;

        let flow = RedirectLogin::new(&server.uri(), "agent");
        let err = flow.login(&creds()).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingRedirect { .. }));
    }

    #[tokio::test]
    async fn test_missing_form() {
        let server = MockServer::start().await;
        mount_redirect_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/sso/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let flow = RedirectLogin::new(&server.uri(), "agent");
        let err = flow.login(&creds()).await.unwrap_err();
        assert!(matches!(err, AuthError::FormNotFound { .. }));
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let server = MockServer::start().await;
        mount_redirect_start(&server).await;
        Mock::given(method("GET"))
            .and(path("/sso/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<form id="form" action="/sso/submit"></form>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sso/submit"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Invalid username or password"))
            .mount(&server)
            .await;

        let flow = RedirectLogin::new(&server.uri(), "agent");
        let err = flow.login(&creds()).await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected { status: 200, .. }));
    }
}
