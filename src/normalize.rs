//! Cleanup helpers for the quirks of the site's JSON payloads.

use scraper::Html;
use serde_json::Value as JsonValue;
use std::time::Duration;

/// Returns the text content of an HTML snippet.
///
/// Names come back with emoji and punctuation as entities (`&amp;`,
/// `&#128512;`); parsing the fragment decodes them and drops any markup.
pub fn strip_html(snippet: &str) -> String {
    if !snippet.contains(['&', '<']) {
        return snippet.to_string();
    }
    Html::parse_fragment(snippet)
        .root_element()
        .text()
        .collect()
}

/// Replaces each listed field holding an array with the array's first element.
///
/// Several numeric fields arrive as `[value, ...]`. Empty arrays become null,
/// and fields that are already scalars are left alone.
pub fn unwrap_singletons(row: &mut JsonValue, fields: &[&str]) {
    let Some(object) = row.as_object_mut() else {
        return;
    };
    for field in fields {
        if let Some(value) = object.get_mut(*field) {
            if let JsonValue::Array(items) = value {
                let first = if items.is_empty() {
                    JsonValue::Null
                } else {
                    items.swap_remove(0)
                };
                *value = first;
            }
        }
    }
}

/// Converts a finish time or gap in seconds to tenth-of-a-second precision.
///
/// Seconds are rounded to whole microseconds first, then the sub-second part
/// is cut after the first digit (never rounded up).
pub fn race_duration(seconds: f64) -> Duration {
    let micros = (seconds * 1_000_000.0).round_ties_even().max(0.0) as u64;
    Duration::from_millis(micros / 100_000 * 100)
}

/// Renders a race duration as `H:MM:SS` or `H:MM:SS.d`.
pub fn format_race_duration(duration: &Duration) -> String {
    let tenths = duration.as_millis() / 100;
    let (secs, tenth) = (tenths / 10, tenths % 10);
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);
    if tenth == 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}:{:02}.{}", hours, minutes, seconds, tenth)
    }
}

/// Serde helpers accepting numbers that arrive either as JSON numbers or as
/// numeric strings.
pub mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::{Deserialize, Serializer};
    use serde_json::Number;
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(Number),
        Str(String),
    }

    impl NumOrStr {
        fn as_f64<E: Error>(&self) -> Result<f64, E> {
            match self {
                NumOrStr::Num(n) => n
                    .as_f64()
                    .ok_or_else(|| E::custom(format!("number out of range: {}", n))),
                NumOrStr::Str(s) => s
                    .trim()
                    .parse()
                    .map_err(|_| E::custom(format!("expected a number, got {:?}", s))),
            }
        }

        fn as_i64<E: Error>(&self) -> Result<i64, E> {
            match self {
                NumOrStr::Num(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                    .ok_or_else(|| E::custom(format!("expected an integer, got {}", n))),
                NumOrStr::Str(s) => s
                    .trim()
                    .parse()
                    .map_err(|_| E::custom(format!("expected an integer, got {:?}", s))),
            }
        }

        fn is_blank(&self) -> bool {
            matches!(self, NumOrStr::Str(s) if s.trim().is_empty())
        }
    }

    pub fn to_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        NumOrStr::deserialize(d)?.as_f64()
    }

    /// `null` and blank strings become `None`.
    pub fn to_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<NumOrStr>::deserialize(d)? {
            Some(v) if !v.is_blank() => v.as_f64().map(Some),
            _ => Ok(None),
        }
    }

    pub fn to_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        NumOrStr::deserialize(d)?.as_i64()
    }

    pub fn to_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let n = NumOrStr::deserialize(d)?.as_i64()?;
        u32::try_from(n).map_err(|_| D::Error::custom(format!("expected a count, got {}", n)))
    }

    pub fn to_u64<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let n = NumOrStr::deserialize(d)?.as_i64()?;
        u64::try_from(n).map_err(|_| D::Error::custom(format!("expected an id, got {}", n)))
    }

    pub fn to_opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        match Option::<NumOrStr>::deserialize(d)? {
            Some(v) if !v.is_blank() => {
                let n = v.as_i64()?;
                u64::try_from(n)
                    .map(Some)
                    .map_err(|_| D::Error::custom(format!("expected an id, got {}", n)))
            }
            _ => Ok(None),
        }
    }

    pub fn to_i64_vec<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<i64>, D::Error> {
        Vec::<NumOrStr>::deserialize(d)?
            .iter()
            .map(NumOrStr::as_i64)
            .collect()
    }

    /// Ids and labels that are sometimes numbers; `null` becomes empty.
    pub fn to_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(match Option::<NumOrStr>::deserialize(d)? {
            Some(NumOrStr::Num(n)) => n.to_string(),
            Some(NumOrStr::Str(s)) => s,
            None => String::new(),
        })
    }

    /// Serializes a race duration in its display form.
    pub fn serialize_race_duration<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_race_duration(d))
    }
}
