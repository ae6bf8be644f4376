//! Incremental assembly of literature records.
//!
//! A [`LiteratureBuilder`] owns one record. Each `add_*` method feeds one
//! field group; none of them fail. Malformed input (a DOI that does not
//! look like one, non-numeric page bounds) is dropped quietly and the
//! record only gets checked when [`LiteratureBuilder::validate_object`]
//! hands it to the validation gateway.
//!
//! # Example
//!
//! ```
//! use hep_schemas::LiteratureBuilder;
//!
//! let mut builder = LiteratureBuilder::new("submitter");
//! builder.add_title("A study of things", None);
//! builder.add_doi("not-a-doi", None);
//! assert!(!builder.is_citeable());
//!
//! builder.add_arxiv_eprint("1607.06746", ["hep-th"]);
//! assert!(builder.is_citeable());
//! ```

use std::fmt::Display;

use serde_json::{json, Map, Value};

use crate::error::ValidateError;
use crate::loader::SchemaStore;
use crate::normalize::{is_valid_doi, normalize_author_name};
use crate::types::{
    Author, PublicationInfo, CITEABLE_LOCATOR_KEYS, CITEABLE_PUBLICATION_KEYS, HEP_SCHEMA,
    SUPERVISOR_ROLE,
};
use crate::validator::validate;

/// Builds a single literature record from loosely ordered calls.
///
/// Not meant to be shared: every mutator takes `&mut self`.
#[derive(Debug, Clone)]
pub struct LiteratureBuilder {
    record: Map<String, Value>,
    source: String,
}

impl LiteratureBuilder {
    /// Create a builder with an empty record.
    ///
    /// `source` is credited for every datum added without an explicit source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            record: Map::new(),
            source: source.into(),
        }
    }

    /// Default source of this builder.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The record assembled so far.
    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    /// Consume the builder, returning the record as a JSON object.
    pub fn into_record(self) -> Value {
        Value::Object(self.record)
    }

    /// Whether the record has enough identification to be cited.
    pub fn is_citeable(&self) -> bool {
        self.record
            .get("citeable")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Validate the record against the `hep` schema of `store`.
    ///
    /// # Errors
    ///
    /// Whatever the gateway reports; see [`crate::validate`].
    pub fn validate_object(&self, store: &SchemaStore) -> Result<(), ValidateError> {
        validate(store, &Value::Object(self.record.clone()), Some(HEP_SCHEMA))
    }

    /// Append an abstract; surrounding whitespace is trimmed.
    pub fn add_abstract(&mut self, text: &str, source: Option<&str>) {
        let entry = json!({
            "value": text.trim(),
            "source": self.resolve_source(source),
        });
        self.append("abstracts", entry);
    }

    /// Add an arXiv e-print. Any e-print makes the record citeable.
    pub fn add_arxiv_eprint<I>(&mut self, arxiv_id: &str, categories: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let entry = json!({
            "value": arxiv_id,
            "categories": collect_strings(categories),
        });
        self.append("arxiv_eprints", entry);
        self.mark_citeable();
    }

    /// Add a DOI if it looks like one; a kept DOI makes the record citeable.
    ///
    /// Anything the DOI pattern rejects is dropped without error.
    pub fn add_doi(&mut self, doi: &str, source: Option<&str>) {
        self.ensure_field("dois", Value::Array(Vec::new()));

        if !is_valid_doi(doi) {
            tracing::debug!(doi, "dropping malformed DOI");
            return;
        }

        let entry = json!({
            "value": doi,
            "source": self.resolve_source(source),
        });
        self.append("dois", entry);
        self.mark_citeable();
    }

    /// Append an author as given. The shape is left to the schema to check.
    pub fn add_author(&mut self, author: impl Into<Value>) {
        self.append("authors", author.into());
    }

    /// Build an author entry without touching any record.
    ///
    /// `supervisor` is three-state: `None` leaves the author without roles,
    /// while any `Some`, `Some(false)` included, marks them as supervisor.
    pub fn make_author(
        full_name: &str,
        affiliations: Option<Vec<String>>,
        supervisor: Option<bool>,
    ) -> Author {
        Author {
            full_name: normalize_author_name(full_name),
            affiliations,
            inspire_roles: supervisor.map(|_| vec![SUPERVISOR_ROLE.to_string()]),
        }
    }

    /// Append one subject category per term, all with the same source.
    pub fn add_inspire_categories<I>(&mut self, terms: I, source: Option<&str>)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let source = self.resolve_source(source);
        let entries: Vec<Value> = terms
            .into_iter()
            .map(|term| json!({ "term": term.as_ref(), "source": source }))
            .collect();
        self.extend("inspire_categories", entries);
    }

    /// Append a note kept out of public display.
    pub fn add_private_notes(&mut self, note: &str, source: Option<&str>) {
        let entry = json!({
            "value": note,
            "source": self.resolve_source(source),
        });
        self.append("_private_notes", entry);
    }

    /// Append a public note.
    pub fn add_public_note(&mut self, note: &str, source: Option<&str>) {
        let entry = json!({
            "value": note,
            "source": self.resolve_source(source),
        });
        self.append("public_notes", entry);
    }

    /// Add a publication info entry and re-evaluate citeability.
    ///
    /// `number_of_pages` is derived when both page bounds are integers.
    /// The record becomes citeable once the accumulated entries cover
    /// `year`, `journal_issue` and `journal_volume`, plus one of
    /// `page_start`, `page_end` or `artid`. Keys may come from different
    /// entries.
    pub fn add_publication_info(&mut self, info: PublicationInfo) {
        let mut entry = info.to_entry();

        match info.number_of_pages() {
            Some(pages) => {
                entry.insert("number_of_pages".into(), Value::from(pages));
            }
            None if info.page_start.is_some() && info.page_end.is_some() => {
                tracing::debug!(
                    page_start = ?info.page_start,
                    page_end = ?info.page_end,
                    "page bounds are not numeric, skipping number_of_pages"
                );
            }
            None => {}
        }

        self.append("publication_info", Value::Object(entry));

        if self.publication_history_is_citeable() {
            self.mark_citeable();
        }
    }

    /// Append an imprint date.
    pub fn add_imprint_date(&mut self, date: &str) {
        self.append("imprints", json!({ "date": date }));
    }

    /// Append a preprint date. `preprint_date` is kept as a sequence of
    /// `{date}` entries like `imprints`.
    pub fn add_preprint_date(&mut self, date: &str) {
        self.append("preprint_date", json!({ "date": date }));
    }

    /// Replace the thesis information. Dates and degree type are lowercased.
    pub fn add_thesis(
        &mut self,
        defense_date: Option<&str>,
        degree_type: Option<&str>,
        institution: Option<&str>,
        date: Option<&str>,
    ) {
        let mut thesis = Map::new();
        let lowered = [
            ("defense_date", defense_date),
            ("degree_type", degree_type),
            ("date", date),
        ];
        for (key, value) in lowered {
            if let Some(value) = value {
                thesis.insert(key.into(), Value::String(value.to_lowercase()));
            }
        }
        if let Some(institution) = institution {
            thesis.insert("institutions".into(), json!([{ "name": institution }]));
        }

        self.replace("thesis_info", Value::Object(thesis));
    }

    /// Append an accelerator experiment by its legacy name.
    pub fn add_accelerator_experiment(&mut self, experiment: &str) {
        self.append("accelerator_experiments", json!({ "legacy_name": experiment }));
    }

    /// Append a language code.
    pub fn add_language(&mut self, language: &str) {
        self.append("languages", Value::String(language.to_string()));
    }

    /// Append a license given by its URL.
    pub fn add_license_url(&mut self, url: &str) {
        self.append("license", json!({ "url": url }));
    }

    /// Append a title.
    pub fn add_title(&mut self, title: &str, source: Option<&str>) {
        let entry = json!({
            "title": title,
            "source": self.resolve_source(source),
        });
        self.append("titles", entry);
    }

    /// Append a translated title in `language`.
    pub fn add_title_translation(&mut self, title: &str, language: &str, source: Option<&str>) {
        let entry = json!({
            "title": title,
            "language": language,
            "source": self.resolve_source(source),
        });
        self.append("title_translations", entry);
    }

    /// Append a URL.
    pub fn add_url(&mut self, url: &str) {
        self.append("urls", json!({ "value": url }));
    }

    /// Add one report number per entry, read from each entry's
    /// `report_number` key (empty when missing).
    pub fn add_report_numbers(&mut self, entries: &[Value], source: Option<&str>) {
        let source = self.resolve_source(source);
        let numbers: Vec<Value> = entries
            .iter()
            .map(|entry| {
                let value = entry
                    .get("report_number")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                json!({ "value": value, "source": source })
            })
            .collect();
        self.extend("report_numbers", numbers);
    }

    /// Append a collaboration name.
    pub fn add_collaboration(&mut self, collaboration: &str) {
        self.append("collaborations", json!({ "value": collaboration }));
    }

    /// Replace the acquisition source of the record.
    pub fn add_acquisition_source(
        &mut self,
        submission_number: impl Display,
        email: Option<&str>,
        source: Option<&str>,
        method: Option<&str>,
        orcid: Option<&str>,
    ) {
        let mut acquisition = Map::new();
        acquisition.insert(
            "submission_number".into(),
            Value::String(submission_number.to_string()),
        );
        acquisition.insert(
            "source".into(),
            Value::String(self.resolve_source(source).to_string()),
        );
        let optional = [("email", email), ("method", method), ("orcid", orcid)];
        for (key, value) in optional {
            if let Some(value) = value {
                acquisition.insert(key.into(), Value::String(value.to_string()));
            }
        }

        self.replace("acquisition_source", Value::Object(acquisition));
    }

    /// Append a document type.
    pub fn add_document_type(&mut self, document_type: &str) {
        self.append("document_type", Value::String(document_type.to_string()));
    }

    // --- Internal implementation ---

    fn resolve_source<'a>(&'a self, source: Option<&'a str>) -> &'a str {
        source.unwrap_or(&self.source)
    }

    /// Insert `default` under `field` unless the field already exists.
    fn ensure_field(&mut self, field: &str, default: Value) -> &mut Value {
        self.record.entry(field).or_insert(default)
    }

    fn append(&mut self, field: &str, entry: Value) {
        self.extend(field, [entry]);
    }

    fn extend(&mut self, field: &str, entries: impl IntoIterator<Item = Value>) {
        if let Value::Array(items) = self.ensure_field(field, Value::Array(Vec::new())) {
            items.extend(entries);
        }
    }

    /// Overwrite `field` wholesale. The key keeps its original position.
    fn replace(&mut self, field: &str, value: Value) {
        *self.ensure_field(field, Value::Null) = value;
    }

    fn mark_citeable(&mut self) {
        self.record.insert("citeable".into(), Value::Bool(true));
    }

    fn publication_history_is_citeable(&self) -> bool {
        let Some(Value::Array(entries)) = self.record.get("publication_info") else {
            return false;
        };
        let present = |key: &&str| entries.iter().any(|entry| entry.get(*key).is_some());

        CITEABLE_PUBLICATION_KEYS.iter().all(present)
            && CITEABLE_LOCATOR_KEYS.iter().any(present)
    }
}

fn collect_strings<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect()
}
