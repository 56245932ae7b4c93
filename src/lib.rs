//! ZwiftPower - league and team reports from zwiftpower.com.
//!
//! This library provides functionality for:
//! - Logging in to ZwiftPower (password handshake or exported browser cookies)
//! - Fetching league standings, league event results and team rosters
//! - Cleaning the payloads into typed, sortable report rows

pub mod auth;
pub mod client;
pub mod config;
pub mod console;
mod cookies;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod reference;
pub mod reports;
pub mod session;

// Re-export commonly used types
pub use auth::{CookieFileLogin, Credentials, LoginFlow, RedirectLogin};
pub use client::Client;
pub use config::Config;
pub use console::Console;
pub use error::{AuthError, ClientError, ConfigError, CookieError};
pub use reference::{CountryTable, RouteTable};
pub use reports::{
    EventResult, GcStanding, Grade, LeagueStandings, RosterRow, Tabular, TeamStanding,
};
pub use session::Session;
