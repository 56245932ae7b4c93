//! Team roster with power profile figures.

use super::{Tabular, opt_cell};
use crate::error::ClientError;
use crate::normalize::{lenient, unwrap_singletons};
use crate::reference::CountryTable;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

const SINGLETON_FIELDS: &[&str] = &["ftp"];

/// Team riders payload; rows stay raw until their singletons are unwrapped.
#[derive(Debug, Deserialize)]
pub struct RosterPayload {
    pub data: Vec<JsonValue>,
}

#[derive(Debug, Deserialize)]
struct RawRider {
    #[serde(deserialize_with = "lenient::to_u64")]
    zwid: u64,
    #[serde(deserialize_with = "lenient::to_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient::to_string")]
    flag: String,
    #[serde(deserialize_with = "lenient::to_i64")]
    div: i64,
    #[serde(default, deserialize_with = "lenient::to_string")]
    age: String,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    ftp: Option<f64>,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    h_1200_wkg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    h_15_wkg: Option<f64>,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    h_1200_watts: Option<f64>,
    #[serde(default, deserialize_with = "lenient::to_opt_f64")]
    h_15_watts: Option<f64>,
}

/// Racing category, ordered A+ first and ungraded last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    B,
    C,
    D,
    #[serde(rename = "")]
    Ungraded,
}

impl Grade {
    /// Maps the site's division code. Codes outside 5/10/20/30/40 are ungraded.
    pub fn from_division(code: i64) -> Self {
        match code {
            5 => Grade::APlus,
            10 => Grade::A,
            20 => Grade::B,
            30 => Grade::C,
            40 => Grade::D,
            _ => Grade::Ungraded,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::Ungraded => "",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One team member's profile snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterRow {
    pub zwid: u64,
    pub name: String,
    /// HTML anchor from the name to the rider's profile page.
    pub link: String,
    pub country: String,
    pub grade: Grade,
    pub age: String,
    pub ftp: Option<f64>,
    pub wkg_20m: Option<f64>,
    pub wkg_15s: Option<f64>,
    pub watts_20m: Option<f64>,
    pub watts_15s: Option<f64>,
}

impl Tabular for RosterRow {
    fn headers() -> &'static [&'static str] {
        &[
            "Name",
            "Country",
            "Grade",
            "Age",
            "FTP",
            "20m WKG",
            "15s WKG",
            "20m Power",
            "15s Power",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.link.clone(),
            self.country.clone(),
            self.grade.to_string(),
            self.age.clone(),
            opt_cell(self.ftp),
            opt_cell(self.wkg_20m),
            opt_cell(self.wkg_15s),
            opt_cell(self.watts_20m),
            opt_cell(self.watts_15s),
        ]
    }
}

/// Anchor linking a rider's name to their profile.
pub fn profile_link(base_url: &str, zwid: u64, name: &str) -> String {
    format!(
        r#"<a href="{}/profile.php?z={}">{}</a>"#,
        base_url.trim_end_matches('/'),
        zwid,
        name
    )
}

/// Builds roster rows ordered by grade, then name.
pub fn build_roster(
    rows: Vec<JsonValue>,
    base_url: &str,
    url: &str,
    countries: &CountryTable,
) -> Result<Vec<RosterRow>, ClientError> {
    let mut roster = rows
        .into_iter()
        .map(|mut row| {
            unwrap_singletons(&mut row, SINGLETON_FIELDS);
            let raw: RawRider =
                serde_json::from_value(row).map_err(|e| ClientError::data_shape(url, e))?;

            Ok(RosterRow {
                link: profile_link(base_url, raw.zwid, &raw.name),
                country: countries.translate(&raw.flag).to_string(),
                grade: Grade::from_division(raw.div),
                zwid: raw.zwid,
                name: raw.name,
                age: raw.age,
                ftp: raw.ftp,
                wkg_20m: raw.h_1200_wkg,
                wkg_15s: raw.h_15_wkg,
                watts_20m: raw.h_1200_watts,
                watts_15s: raw.h_15_watts,
            })
        })
        .collect::<Result<Vec<_>, ClientError>>()?;

    roster.sort_by(|a, b| a.grade.cmp(&b.grade).then_with(|| a.name.cmp(&b.name)));
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rider(zwid: u64, name: &str, div: i64) -> JsonValue {
        json!({
            "zwid": zwid,
            "name": name,
            "flag": "ie",
            "div": div,
            "age": "30-39",
            "ftp": ["280", 0],
            "h_1200_wkg": "4.1",
            "h_15_wkg": 11.2,
            "h_1200_watts": "300",
            "h_15_watts": ""
        })
    }

    #[test]
    fn test_division_mapping() {
        assert_eq!(Grade::from_division(0).label(), "");
        assert_eq!(Grade::from_division(5).label(), "A+");
        assert_eq!(Grade::from_division(10).label(), "A");
        assert_eq!(Grade::from_division(20).label(), "B");
        assert_eq!(Grade::from_division(30).label(), "C");
        assert_eq!(Grade::from_division(40).label(), "D");
        assert_eq!(Grade::from_division(20), Grade::from_division(20));
        assert_eq!(Grade::from_division(99), Grade::Ungraded);
    }

    #[test]
    fn test_grade_order() {
        let mut grades = vec![
            Grade::Ungraded,
            Grade::D,
            Grade::A,
            Grade::APlus,
            Grade::C,
            Grade::B,
        ];
        grades.sort();
        assert_eq!(
            grades,
            [Grade::APlus, Grade::A, Grade::B, Grade::C, Grade::D, Grade::Ungraded]
        );
    }

    #[test]
    fn test_build_roster_sorted() {
        let countries: CountryTable = [("ie".to_string(), "Ireland".to_string())]
            .into_iter()
            .collect();
        let rows = vec![
            rider(1, "Zoe", 20),
            rider(2, "Newbie", 0),
            rider(3, "Adam", 20),
            rider(4, "Max", 5),
        ];

        let roster = build_roster(rows, "https://zwiftpower.com", "u", &countries).unwrap();
        let names: Vec<&str> = roster.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Max", "Adam", "Zoe", "Newbie"]);

        let adam = &roster[1];
        assert_eq!(adam.grade, Grade::B);
        assert_eq!(adam.country, "Ireland");
        assert_eq!(adam.ftp, Some(280.0));
        assert_eq!(adam.watts_20m, Some(300.0));
        assert_eq!(adam.watts_15s, None);
        assert_eq!(
            adam.link,
            r#"<a href="https://zwiftpower.com/profile.php?z=3">Adam</a>"#
        );
    }

    #[test]
    fn test_roster_cells() {
        let countries = CountryTable::default();
        let roster = build_roster(vec![rider(9, "Solo", 10)], "http://h/", "u", &countries).unwrap();
        let cells = roster[0].cells();
        assert_eq!(cells.len(), RosterRow::headers().len());
        assert_eq!(cells[0], r#"<a href="http://h/profile.php?z=9">Solo</a>"#);
        assert_eq!(cells[1], "ie");
        assert_eq!(cells[2], "A");
        assert_eq!(cells[8], "");
    }

    #[test]
    fn test_missing_division_is_error() {
        let err = build_roster(
            vec![json!({"zwid": 1, "name": "x"})],
            "http://h",
            "u",
            &CountryTable::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::DataShape { .. }));
    }
}
