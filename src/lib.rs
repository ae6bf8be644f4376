//! HEP literature records
//!
//! Incremental assembly of bibliographic ("literature") records and their
//! validation against schemas kept in a local schema store.
//!
//! A [`LiteratureBuilder`] collects fields in any order, normalizing DOIs
//! and author names on the way and keeping the derived `citeable` flag up
//! to date. Nothing fails while building: the record is only checked when
//! it is handed to [`validate`] (or [`LiteratureBuilder::validate_object`]).
//!
//! # Example
//!
//! ```no_run
//! use hep_schemas::{LiteratureBuilder, SchemaStore};
//!
//! let store = SchemaStore::new("schemas");
//!
//! let mut builder = LiteratureBuilder::new("arXiv");
//! builder.add_title("Observation of gravitational waves", None);
//! builder.add_abstract("We report the observation...", None);
//! builder.add_arxiv_eprint("1602.03837", ["gr-qc"]);
//! builder.add_author(LiteratureBuilder::make_author("Abbott, B. P.", None, None));
//!
//! builder.validate_object(&store)?;
//! # Ok::<(), hep_schemas::ValidateError>(())
//! ```
//!
//! # Citeability
//!
//! | Added | Effect on `citeable` |
//! |-------|----------------------|
//! | arXiv e-print | set |
//! | DOI matching the DOI pattern | set |
//! | malformed DOI | unchanged, DOI dropped |
//! | publication info completing year, issue, volume and a page or artid | set |

mod builder;
mod error;
mod loader;
mod normalize;
mod resolver;
mod submission;
mod types;
mod validator;

pub use builder::LiteratureBuilder;
pub use error::{LoadError, ValidateError, Violation};
pub use loader::{
    is_url, load_schema_file, navigate_fragment, normalize_schema_name, LoadedSchema,
    SchemaStore, DEFAULT_SCHEMAS_PATH, SCHEMAS_PATH_ENV,
};
pub use normalize::{is_author_initials, is_valid_doi, normalize_author_name};
pub use resolver::{bundle_refs, LocalRefResolver};
pub use submission::{
    Acquisition, Submission, SubmissionNumber, SubmittedAuthor, SubmittedThesis,
    TitleTranslation,
};
pub use types::{json_type_name, Author, PublicationInfo, HEP_SCHEMA, SCHEMA_KEY};
pub use validator::{validate, validate_against_schema};
