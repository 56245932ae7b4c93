//! Netscape cookie file support.
//!
//! Lets a browser session exported with a cookie extension stand in for the
//! password login.

use crate::error::CookieError;
use reqwest::Url;
use reqwest::cookie::Jar;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Cookie entry parsed from a Netscape cookie file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NetscapeCookie {
    domain: String,
    include_subdomains: bool,
    path: String,
    secure: bool,
    expires_unix: Option<u64>,
    name: String,
    value: String,
    http_only: bool,
}

impl NetscapeCookie {
    fn is_expired(&self, now_unix: u64) -> bool {
        self.expires_unix.is_some_and(|ts| ts <= now_unix)
    }

    /// Renders the cookie as a `Set-Cookie` value.
    fn to_set_cookie(&self) -> String {
        let mut cookie_str = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.include_subdomains {
            cookie_str.push_str(&format!("; Domain={}", self.domain));
        }
        if self.secure {
            cookie_str.push_str("; Secure");
        }
        if self.http_only {
            cookie_str.push_str("; HttpOnly");
        }
        cookie_str
    }
}

/// Loads the unexpired cookies of a Netscape cookie file into a fresh jar.
///
/// Returns the jar together with the number of cookies loaded.
pub fn load_cookie_jar(path: &Path) -> Result<(Arc<Jar>, usize), CookieError> {
    let content = std::fs::read_to_string(path)?;
    let cookies = parse_netscape_cookies(&content)?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let jar = Arc::new(Jar::default());
    let mut loaded = 0;
    for cookie in cookies.iter().filter(|c| !c.is_expired(now)) {
        let host = cookie.domain.trim_start_matches('.');
        if host.is_empty() {
            return Err(CookieError::InvalidDomain(cookie.domain.clone()));
        }
        let url = Url::parse(&format!("https://{}/", host))
            .map_err(|_| CookieError::InvalidDomain(cookie.domain.clone()))?;

        jar.add_cookie_str(&cookie.to_set_cookie(), &url);
        loaded += 1;
    }

    Ok((jar, loaded))
}

fn parse_netscape_cookies(content: &str) -> Result<Vec<NetscapeCookie>, CookieError> {
    let mut cookies = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        let (http_only, line) = if let Some(stripped) = line.strip_prefix("#HttpOnly_") {
            (true, stripped)
        } else if line.starts_with('#') {
            continue;
        } else {
            (false, line)
        };

        let fields: Vec<&str> = line.splitn(7, '\t').collect();
        let [domain, subdomains, path, secure, expires, name, value] = fields[..] else {
            return Err(CookieError::InvalidLine(line.to_string()));
        };

        let expires_unix = expires.parse::<u64>().ok().filter(|ts| *ts != 0);

        cookies.push(NetscapeCookie {
            domain: domain.to_string(),
            include_subdomains: subdomains.eq_ignore_ascii_case("true"),
            path: path.to_string(),
            secure: secure.eq_ignore_ascii_case("true"),
            expires_unix,
            name: name.to_string(),
            value: value.to_string(),
            http_only,
        });
    }

    Ok(cookies)
}
