//! Catalog payloads exactly as the primary source returns them.
//!
//! Every field is optional on the wire and several change shape between the
//! list and detail endpoints, so deserialization is deliberately lenient.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnime {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub russian: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub english: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub japanese: Vec<String>,
    #[serde(default, deserialize_with = "lenient_image")]
    pub image: Option<RawImage>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub episodes: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub aired_on: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<RawNamed>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub studios: Vec<RawNamed>,
}

impl RawAnime {
    pub fn english_title(&self) -> Option<&str> {
        first_non_blank(&self.english)
    }

    pub fn japanese_title(&self) -> Option<&str> {
        first_non_blank(&self.japanese)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImage {
    #[serde(default, deserialize_with = "lenient_string")]
    pub original: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub preview: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub x96: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub x48: Option<String>,
}

/// Genre or studio entry nested inside a record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawNamed {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub russian: Option<String>,
}

impl RawNamed {
    /// Localized name first, then the generic one.
    pub fn display_name(&self) -> Option<&str> {
        [self.russian.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

fn first_non_blank(values: &[String]) -> Option<&str> {
    values.iter().map(|s| s.trim()).find(|s| !s.is_empty())
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<RawNamed>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// Strings pass through and numbers become their text; any other shape is
/// dropped instead of failing the record.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_image<'de, D>(deserializer: D) -> Result<Option<RawImage>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}
