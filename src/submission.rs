//! Literature suggestion forms.
//!
//! A [`Submission`] is the flat JSON a suggestion form posts. It is turned
//! into a record by replaying its fields through a [`LiteratureBuilder`],
//! so all normalization and citeability rules apply unchanged.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::builder::LiteratureBuilder;
use crate::types::PublicationInfo;

/// Flat literature suggestion as posted by a submission form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub title: Option<String>,
    pub title_translation: Option<TitleTranslation>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub arxiv_id: Option<String>,
    pub arxiv_categories: Vec<String>,
    pub doi: Option<String>,
    pub authors: Vec<SubmittedAuthor>,
    pub supervisors: Vec<SubmittedAuthor>,
    pub collaboration: Option<String>,
    pub experiment: Option<String>,
    pub subject_terms: Vec<String>,
    pub language: Option<String>,
    pub license_url: Option<String>,
    pub url: Option<String>,
    pub report_numbers: Vec<Value>,
    pub publication_info: Option<PublicationInfo>,
    pub thesis: Option<SubmittedThesis>,
    pub imprint_date: Option<String>,
    pub preprint_date: Option<String>,
    pub document_type: Option<String>,
    pub public_notes: Option<String>,
    pub private_notes: Option<String>,
    pub acquisition: Option<Acquisition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TitleTranslation {
    pub title: String,
    pub language: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmittedAuthor {
    pub full_name: String,
    pub affiliations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SubmittedThesis {
    pub defense_date: Option<String>,
    pub degree_type: Option<String>,
    pub institution: Option<String>,
    pub date: Option<String>,
}

/// Who submitted the suggestion and how.
#[derive(Debug, Clone, Deserialize)]
pub struct Acquisition {
    pub submission_number: SubmissionNumber,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub orcid: Option<String>,
}

/// Forms send submission numbers either as numbers or as strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SubmissionNumber {
    Number(u64),
    Text(String),
}

impl fmt::Display for SubmissionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionNumber::Number(n) => write!(f, "{n}"),
            SubmissionNumber::Text(s) => f.write_str(s),
        }
    }
}

impl Submission {
    /// Parse a submission from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Replay every supplied field into `builder`.
    pub fn apply(&self, builder: &mut LiteratureBuilder) {
        if let Some(title) = &self.title {
            builder.add_title(title, None);
        }
        if let Some(translation) = &self.title_translation {
            builder.add_title_translation(&translation.title, &translation.language, None);
        }
        if let Some(text) = &self.abstract_text {
            builder.add_abstract(text, None);
        }
        if let Some(arxiv_id) = &self.arxiv_id {
            builder.add_arxiv_eprint(arxiv_id, &self.arxiv_categories);
        }
        if let Some(doi) = &self.doi {
            builder.add_doi(doi, None);
        }

        for author in &self.authors {
            builder.add_author(LiteratureBuilder::make_author(
                &author.full_name,
                author.affiliations.clone(),
                None,
            ));
        }
        for supervisor in &self.supervisors {
            builder.add_author(LiteratureBuilder::make_author(
                &supervisor.full_name,
                supervisor.affiliations.clone(),
                Some(true),
            ));
        }

        if let Some(collaboration) = &self.collaboration {
            builder.add_collaboration(collaboration);
        }
        if let Some(experiment) = &self.experiment {
            builder.add_accelerator_experiment(experiment);
        }
        if !self.subject_terms.is_empty() {
            builder.add_inspire_categories(&self.subject_terms, None);
        }
        if let Some(language) = &self.language {
            builder.add_language(language);
        }
        if let Some(url) = &self.license_url {
            builder.add_license_url(url);
        }
        if let Some(url) = &self.url {
            builder.add_url(url);
        }
        if !self.report_numbers.is_empty() {
            builder.add_report_numbers(&self.report_numbers, None);
        }
        if let Some(info) = &self.publication_info {
            builder.add_publication_info(info.clone());
        }
        if let Some(thesis) = &self.thesis {
            builder.add_thesis(
                thesis.defense_date.as_deref(),
                thesis.degree_type.as_deref(),
                thesis.institution.as_deref(),
                thesis.date.as_deref(),
            );
        }
        if let Some(date) = &self.imprint_date {
            builder.add_imprint_date(date);
        }
        if let Some(date) = &self.preprint_date {
            builder.add_preprint_date(date);
        }
        if let Some(document_type) = &self.document_type {
            builder.add_document_type(document_type);
        }
        if let Some(note) = &self.public_notes {
            builder.add_public_note(note, None);
        }
        if let Some(note) = &self.private_notes {
            builder.add_private_notes(note, None);
        }
        if let Some(acquisition) = &self.acquisition {
            builder.add_acquisition_source(
                &acquisition.submission_number,
                acquisition.email.as_deref(),
                acquisition.source.as_deref(),
                acquisition.method.as_deref(),
                acquisition.orcid.as_deref(),
            );
        }
    }

    /// Build a fresh record from this submission.
    pub fn build(&self, source: &str) -> LiteratureBuilder {
        let mut builder = LiteratureBuilder::new(source);
        self.apply(&mut builder);
        builder
    }
}
