//! Route names keyed by the numeric route ids in event listings.

use crate::error::ClientError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Route names keyed by the platform's route id.
const BUNDLED_ROUTES: &str = include_str!("../../data/routes.json");

/// A route file entry: either the bare name or an object carrying one.
#[derive(Deserialize)]
#[serde(untagged)]
enum RouteEntry {
    Name(String),
    Detailed { name: String },
}

impl RouteEntry {
    fn into_name(self) -> String {
        match self {
            RouteEntry::Name(name) | RouteEntry::Detailed { name } => name,
        }
    }
}

/// Immutable route-id to route-name lookup.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    names: HashMap<String, String>,
}

impl RouteTable {
    /// Parses a JSON object keyed by route id.
    ///
    /// Values may be plain names (`{"1": "Volcano Flat"}`) or objects with a
    /// `name` field (`{"1": {"name": "Volcano Flat", "distance": 12.3}}`).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, RouteEntry> = serde_json::from_str(json)?;
        Ok(Self {
            names: raw
                .into_iter()
                .map(|(id, entry)| (id, entry.into_name()))
                .collect(),
        })
    }

    /// The bundled routes, with entries from `path` added on top.
    ///
    /// A route file entry replaces a bundled entry with the same id.
    pub fn load(path: Option<&Path>) -> Result<Self, ClientError> {
        let mut table = Self::from_json(BUNDLED_ROUTES)
            .map_err(|e| ClientError::Reference(format!("bundled routes: {}", e)))?;

        if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ClientError::Reference(format!("{}: {}", path.display(), e)))?;
            let extra = Self::from_json(&content)
                .map_err(|e| ClientError::Reference(format!("{}: {}", path.display(), e)))?;
            table.names.extend(extra.names);
        }

        debug!(routes = table.len(), "route table ready");
        Ok(table)
    }

    /// The route's name, or the id itself when the table doesn't know it.
    pub fn name<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for RouteTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
