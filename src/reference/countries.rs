//! Country and subdivision names keyed by the flag codes the site uses.

use crate::error::ClientError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// ISO 3166-1 table in iso-codes JSON layout.
const BUNDLED_COUNTRIES: &str = include_str!("../../data/iso3166-1.json");

/// ISO 3166-2 table in iso-codes JSON layout.
const BUNDLED_SUBDIVISIONS: &str = include_str!("../../data/iso3166-2.json");

/// UK constituent countries missing from ISO 3166-2 under these codes.
const UK_NATIONS: [(&str, &str); 4] = [
    ("gb-eng", "England"),
    ("gb-nir", "Northern Ireland"),
    ("gb-sct", "Scotland"),
    ("gb-wls", "Wales"),
];

#[derive(Deserialize)]
struct CountryFile {
    #[serde(rename = "3166-1")]
    entries: Vec<CountryEntry>,
}

#[derive(Deserialize)]
struct CountryEntry {
    alpha_2: String,
    name: String,
}

#[derive(Deserialize)]
struct SubdivisionFile {
    #[serde(rename = "3166-2")]
    entries: Vec<SubdivisionEntry>,
}

#[derive(Deserialize)]
struct SubdivisionEntry {
    code: String,
    name: String,
}

/// Immutable mapping from lowercase flag code to display name.
#[derive(Debug, Clone, Default)]
pub struct CountryTable {
    names: HashMap<String, String>,
}

impl CountryTable {
    /// Builds the table from iso-codes JSON documents.
    ///
    /// Subdivisions override countries on key clashes, and the UK nations
    /// override both.
    pub fn from_iso_json(
        countries: &str,
        subdivisions: Option<&str>,
    ) -> Result<Self, serde_json::Error> {
        let countries: CountryFile = serde_json::from_str(countries)?;
        let mut names: HashMap<String, String> = countries
            .entries
            .into_iter()
            .map(|e| (e.alpha_2.to_lowercase(), e.name))
            .collect();

        if let Some(subdivisions) = subdivisions {
            let subdivisions: SubdivisionFile = serde_json::from_str(subdivisions)?;
            names.extend(
                subdivisions
                    .entries
                    .into_iter()
                    .map(|e| (e.code.to_lowercase(), e.name)),
            );
        }

        names.extend(
            UK_NATIONS
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string())),
        );

        Ok(Self { names })
    }

    /// Bundled countries and subdivisions.
    ///
    /// `subdivisions_file` replaces the bundled subdivision table, e.g. with
    /// a newer iso-codes release.
    pub fn load(subdivisions_file: Option<&Path>) -> Result<Self, ClientError> {
        let override_file = match subdivisions_file {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
                ClientError::Reference(format!("{}: {}", path.display(), e))
            })?),
            None => None,
        };
        let subdivisions = override_file.as_deref().unwrap_or(BUNDLED_SUBDIVISIONS);

        let table = Self::from_iso_json(BUNDLED_COUNTRIES, Some(subdivisions))
            .map_err(|e| ClientError::Reference(e.to_string()))?;
        debug!(
            codes = table.len(),
            subdivisions = ?subdivisions_file,
            "country table ready"
        );
        Ok(table)
    }

    /// Returns the name for `code`, or `code` itself when unknown.
    pub fn translate<'a>(&'a self, code: &'a str) -> &'a str {
        self.names.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for CountryTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
