//! Core types for literature records.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Schema every literature record is validated against.
pub const HEP_SCHEMA: &str = "hep";

/// Record key holding the self-describing schema reference.
pub const SCHEMA_KEY: &str = "$schema";

/// Keys that must all be present across `publication_info` for a record
/// to become citeable.
pub const CITEABLE_PUBLICATION_KEYS: &[&str] = &["year", "journal_issue", "journal_volume"];

/// At least one of these must accompany [`CITEABLE_PUBLICATION_KEYS`].
pub const CITEABLE_LOCATOR_KEYS: &[&str] = &["page_start", "page_end", "artid"];

/// Role attached to thesis supervisors.
pub const SUPERVISOR_ROLE: &str = "supervisor";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// An author entry as produced by `LiteratureBuilder::make_author`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub full_name: String,
    pub affiliations: Option<Vec<String>>,
    pub inspire_roles: Option<Vec<String>>,
}

impl From<Author> for Value {
    fn from(author: Author) -> Self {
        let mut obj = Map::new();
        obj.insert("full_name".into(), Value::String(author.full_name));
        if let Some(affiliations) = author.affiliations {
            let wrapped = affiliations
                .into_iter()
                .map(|affiliation| json!({ "value": affiliation }))
                .collect();
            obj.insert("affiliations".into(), Value::Array(wrapped));
        }
        if let Some(roles) = author.inspire_roles {
            obj.insert("inspire_roles".into(), json!(roles));
        }
        Value::Object(obj)
    }
}

/// Where a document was published. Every field is optional; only the
/// supplied ones end up in the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationInfo {
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub cnum: Option<String>,
    #[serde(default)]
    pub artid: Option<String>,
    #[serde(default)]
    pub page_end: Option<String>,
    #[serde(default)]
    pub page_start: Option<String>,
    #[serde(default)]
    pub journal_issue: Option<String>,
    #[serde(default)]
    pub journal_title: Option<String>,
    #[serde(default)]
    pub journal_volume: Option<String>,
}

impl PublicationInfo {
    /// Page count derived from both page bounds, when both parse as integers
    /// and the count fits in an `i64`.
    pub fn number_of_pages(&self) -> Option<i64> {
        let start = self.page_start.as_deref()?.trim();
        let end = self.page_end.as_deref()?.trim();
        if start.is_empty() || end.is_empty() {
            return None;
        }
        let start: i64 = start.parse().ok()?;
        let end: i64 = end.parse().ok()?;
        end.checked_sub(start)?.checked_add(1)
    }

    /// Record entry holding only the supplied keys.
    pub fn to_entry(&self) -> Map<String, Value> {
        let mut entry = Map::new();
        let strings = [
            ("cnum", &self.cnum),
            ("artid", &self.artid),
            ("page_end", &self.page_end),
            ("page_start", &self.page_start),
            ("journal_issue", &self.journal_issue),
            ("journal_title", &self.journal_title),
            ("journal_volume", &self.journal_volume),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                entry.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        if let Some(year) = self.year {
            entry.insert("year".into(), Value::from(year));
        }
        entry
    }
}
