//! Schema loading from the local schema store.
//!
//! Schemas are addressed by name (`hep`, `records/hep.json`, or a full
//! `https://host/schemas/records/hep.json` URL as found in a record's
//! `$schema` key) and read from a directory tree. Nothing is fetched over
//! the network.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::error::LoadError;
use crate::types::json_type_name;

/// Environment variable naming the schema store root.
pub const SCHEMAS_PATH_ENV: &str = "HEP_SCHEMAS_PATH";

/// Store root used when nothing else is configured.
pub const DEFAULT_SCHEMAS_PATH: &str = "schemas";

const SCHEMAS_URL_SEGMENT: &str = "/schemas/";

/// A schema document together with where it was read from.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    /// Normalized name the schema was requested under.
    pub name: String,
    /// File the document was read from.
    pub path: PathBuf,
    pub document: Value,
}

impl LoadedSchema {
    /// Directory relative `$ref`s of this document are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }
}

/// Directory of schema documents with a process-wide document cache.
///
/// Documents never change once loaded, so the cache is only ever filled.
/// Concurrent readers are fine.
#[derive(Debug)]
pub struct SchemaStore {
    root: PathBuf,
    cache: RwLock<HashMap<String, Arc<LoadedSchema>>>,
}

impl SchemaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Store rooted at `$HEP_SCHEMAS_PATH`, or `./schemas` when unset.
    pub fn from_env() -> Self {
        let root = std::env::var_os(SCHEMAS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCHEMAS_PATH));
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load a schema by name, reading it from disk on first use.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::SchemaNotFound` if no document matches `name`,
    /// `LoadError::InvalidJson` / `LoadError::NotAnObject` if the document
    /// is not a JSON object.
    pub fn load_schema(&self, name: &str) -> Result<Arc<LoadedSchema>, LoadError> {
        let normalized = normalize_schema_name(name);

        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalized)
            .cloned();
        if let Some(schema) = cached {
            tracing::debug!(schema = %normalized, "schema cache hit");
            return Ok(schema);
        }

        let path = self.schema_path(name)?;
        tracing::debug!(schema = %normalized, path = %path.display(), "loading schema");
        let document = load_schema_file(&path)?;
        if !document.is_object() {
            return Err(LoadError::NotAnObject {
                name: normalized,
                actual: json_type_name(&document).to_string(),
            });
        }

        let schema = Arc::new(LoadedSchema {
            name: normalized.clone(),
            path,
            document,
        });
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(normalized).or_insert(schema)))
    }

    /// File backing the schema called `name`.
    ///
    /// Tries `<root>/<name>.json`, then `<root>/<name>`. Names that would
    /// leave the store root are never resolved.
    pub fn schema_path(&self, name: &str) -> Result<PathBuf, LoadError> {
        let normalized = normalize_schema_name(name);
        let not_found = || LoadError::SchemaNotFound {
            name: name.to_string(),
        };

        let relative = Path::new(&normalized);
        let stays_inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if normalized.is_empty() || !stays_inside {
            return Err(not_found());
        }

        let candidates = [
            self.root.join(format!("{normalized}.json")),
            self.root.join(relative),
        ];
        candidates
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(not_found)
    }
}

/// Reduce a schema reference to its store-relative name without extension.
///
/// URLs keep only what follows their last `/schemas/` segment.
pub fn normalize_schema_name(name: &str) -> String {
    let name = name.trim();
    let name = match name.rfind(SCHEMAS_URL_SEGMENT) {
        Some(idx) => &name[idx + SCHEMAS_URL_SEGMENT.len()..],
        None => name,
    };
    let name = name.trim_start_matches('/');
    name.strip_suffix(".json").unwrap_or(name).to_string()
}

/// Load a JSON document from a file path.
///
/// # Errors
///
/// Returns `LoadError::ReadError` if the file can't be read,
/// or `LoadError::InvalidJson` if it isn't valid JSON.
pub fn load_schema_file(path: &Path) -> Result<Value, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LoadError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Navigate a JSON Pointer fragment (e.g., "#/definitions/foo").
///
/// Returns the value at the given JSON Pointer path within the document.
pub fn navigate_fragment(document: &Value, fragment: &str) -> Result<Value, LoadError> {
    let path = fragment.trim_start_matches('#').trim_start_matches('/');
    if path.is_empty() {
        return Ok(document.clone());
    }

    let mut current = document;
    for part in path.split('/') {
        // Unescape JSON Pointer encoding (~1 = /, ~0 = ~)
        let key = part.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            other => other.get(&key),
        }
        .ok_or_else(|| LoadError::BundleError {
            message: format!("fragment not found: {}", fragment),
        })?;
    }
    Ok(current.clone())
}
