//! Local `$ref` resolution for schema documents.
//!
//! Schemas in the store split their definitions over several files
//! (`{"$ref": "elements/author.json"}`). Before validation those references
//! are inlined from disk, relative to the file that contains them, so the
//! validator never needs to go looking for documents itself.
//!
//! Fragment refs inside an inlined file (`#`, `#/definitions/node`) cannot
//! stay as they are once the file is copied into another document. Such a
//! file is also stored whole under the root's `definitions`, and its
//! fragment refs are rewritten to point there. Recursive definitions keep
//! working that way, without being expanded.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::loader::{is_url, load_schema_file, navigate_fragment, LoadedSchema};

const DEFINITIONS_KEY: &str = "definitions";

/// Resolves the file references of one loaded schema against its own
/// directory.
#[derive(Debug, Clone, Copy)]
pub struct LocalRefResolver<'a> {
    schema: &'a LoadedSchema,
}

impl<'a> LocalRefResolver<'a> {
    pub fn from_schema(schema: &'a LoadedSchema) -> Self {
        Self { schema }
    }

    /// Return a copy of the schema with every file reference inlined.
    ///
    /// Fragment references of the root document (`#/definitions/...`, `#`)
    /// are left for the validator.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::RemoteRef` for `http(s)` references and
    /// `LoadError::BundleError` for missing targets or reference cycles
    /// between files.
    pub fn resolve(&self) -> Result<Value, LoadError> {
        let mut document = self.schema.document.clone();
        bundle_refs(&mut document, self.schema.base_dir())?;
        Ok(document)
    }
}

/// Recursively inline file `$ref` pointers found in `schema`.
///
/// Internal refs (`#/...`, `#`) in the root schema are left for the
/// validator. Internal refs in loaded files are rewritten to point into a
/// copy of that file kept under the root's `definitions`.
pub fn bundle_refs(schema: &mut Value, base_dir: &Path) -> Result<(), LoadError> {
    let mut bundler = Bundler::new(schema);
    bundler.walk(schema, base_dir, None)?;
    bundler.hoist_into(schema)
}

/// Fragment refs of one inlined file are rewritten relative to `pointer`.
struct FileScope {
    pointer: String,
    used: bool,
}

#[derive(Default)]
struct Bundler {
    /// Inlined files by canonical path, with their refs already handled.
    files: HashMap<String, Value>,
    /// Files currently being inlined.
    visiting: HashSet<String>,
    /// File copies to store under the root's `definitions`.
    hoisted: Map<String, Value>,
    /// `definitions` keys already in use.
    taken: HashSet<String>,
}

impl Bundler {
    fn new(root: &Value) -> Self {
        let taken = root
            .get(DEFINITIONS_KEY)
            .and_then(Value::as_object)
            .map(|defs| defs.keys().cloned().collect())
            .unwrap_or_default();
        Self {
            taken,
            ..Default::default()
        }
    }

    fn walk(
        &mut self,
        schema: &mut Value,
        base_dir: &Path,
        mut scope: Option<&mut FileScope>,
    ) -> Result<(), LoadError> {
        match schema {
            Value::Object(obj) => {
                let ref_val = obj.get("$ref").and_then(Value::as_str).map(str::to_string);
                let mut inlined = None;
                match ref_val {
                    Some(ref_val) if ref_val.starts_with('#') => {
                        // Root document fragments are left for the validator.
                        if let Some(scope) = scope.as_deref_mut() {
                            let rewritten = format!("{}{}", scope.pointer, &ref_val[1..]);
                            obj.insert("$ref".into(), Value::String(rewritten));
                            scope.used = true;
                        }
                    }
                    Some(ref_val) => {
                        obj.remove("$ref");
                        inlined = Some(self.load_external(&ref_val, base_dir)?);
                    }
                    None => {}
                }

                for value in obj.values_mut() {
                    self.walk(value, base_dir, scope.as_deref_mut())?;
                }

                if let Some(Value::Object(target)) = inlined {
                    for (k, v) in target {
                        obj.entry(k).or_insert(v);
                    }
                }
            }
            Value::Array(arr) => {
                for item in arr {
                    self.walk(item, base_dir, scope.as_deref_mut())?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Load the target of a file reference (`other.json` or `other.json#/x`)
    /// with its own references already handled.
    fn load_external(&mut self, ref_val: &str, base_dir: &Path) -> Result<Value, LoadError> {
        let (file_part, fragment) = match ref_val.find('#') {
            Some(idx) => (&ref_val[..idx], &ref_val[idx..]),
            None => (ref_val, ""),
        };

        if is_url(file_part) {
            return Err(LoadError::RemoteRef {
                reference: ref_val.to_string(),
            });
        }

        let ref_path = base_dir.join(file_part);
        if !ref_path.is_file() {
            return Err(LoadError::BundleError {
                message: format!("referenced schema not found: {}", ref_path.display()),
            });
        }

        let file_key = ref_path
            .canonicalize()
            .unwrap_or_else(|_| ref_path.clone())
            .display()
            .to_string();

        if let Some(document) = self.files.get(&file_key) {
            return navigate_fragment(document, fragment);
        }
        if !self.visiting.insert(file_key.clone()) {
            return Err(LoadError::BundleError {
                message: format!("circular reference detected: {}", ref_val),
            });
        }

        tracing::debug!(reference = %ref_val, path = %ref_path.display(), "inlining schema reference");

        let mut document = load_schema_file(&ref_path)?;
        let key = self.reserve_key(&ref_path);
        let mut scope = FileScope {
            pointer: format!("#/{}/{}", DEFINITIONS_KEY, escape_pointer(&key)),
            used: false,
        };
        let ref_dir = ref_path.parent().unwrap_or(base_dir);
        let walked = self.walk(&mut document, ref_dir, Some(&mut scope));
        self.visiting.remove(&file_key);
        walked?;

        if scope.used {
            let mut copy = document.clone();
            if let Value::Object(obj) = &mut copy {
                obj.remove("$schema");
                obj.remove("$id");
            }
            self.hoisted.insert(key, copy);
        }

        let target = navigate_fragment(&document, fragment);
        self.files.insert(file_key, document);
        target
    }

    /// Pick an unused `definitions` key named after the file.
    fn reserve_key(&mut self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "schema".to_string());
        let mut key = stem.clone();
        let mut n = 2;
        while self.taken.contains(&key) {
            key = format!("{stem}_{n}");
            n += 1;
        }
        self.taken.insert(key.clone());
        key
    }

    /// Store the hoisted file copies under the root's `definitions`.
    fn hoist_into(self, root: &mut Value) -> Result<(), LoadError> {
        if self.hoisted.is_empty() {
            return Ok(());
        }
        let definitions = root
            .as_object_mut()
            .map(|obj| {
                obj.entry(DEFINITIONS_KEY)
                    .or_insert_with(|| Value::Object(Map::new()))
            })
            .and_then(Value::as_object_mut)
            .ok_or_else(|| LoadError::BundleError {
                message: "schema root cannot hold referenced definitions".to_string(),
            })?;
        definitions.extend(self.hoisted);
        Ok(())
    }
}

/// Escape a key for use in a JSON pointer (`~` and `/`).
fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: Value) {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content.to_string()).unwrap();
    }

    fn loaded(dir: &TempDir, name: &str) -> LoadedSchema {
        let path = dir.path().join(name);
        LoadedSchema {
            name: name.trim_end_matches(".json").to_string(),
            document: load_schema_file(&path).unwrap(),
            path,
        }
    }

    #[test]
    fn inlines_relative_file_ref() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hep.json",
            json!({
                "type": "object",
                "properties": { "titles": { "$ref": "elements/titles.json" } }
            }),
        );
        write(
            &dir,
            "elements/titles.json",
            json!({ "type": "array", "items": { "type": "object" } }),
        );

        let schema = loaded(&dir, "hep.json");
        let resolved = LocalRefResolver::from_schema(&schema).resolve().unwrap();

        assert_eq!(
            resolved["properties"]["titles"],
            json!({ "type": "array", "items": { "type": "object" } })
        );
    }

    #[test]
    fn nested_refs_resolve_relative_to_their_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hep.json",
            json!({ "properties": { "authors": { "$ref": "elements/authors.json" } } }),
        );
        write(
            &dir,
            "elements/authors.json",
            json!({
                "type": "array",
                "items": { "$ref": "#/definitions/author" },
                "definitions": {
                    "author": {
                        "type": "object",
                        "properties": { "full_name": { "$ref": "name.json" } }
                    }
                }
            }),
        );
        write(&dir, "elements/name.json", json!({ "type": "string" }));

        let schema = loaded(&dir, "hep.json");
        let resolved = LocalRefResolver::from_schema(&schema).resolve().unwrap();

        assert_eq!(
            resolved["properties"]["authors"]["items"],
            json!({ "$ref": "#/definitions/authors/definitions/author" })
        );
        assert_eq!(
            resolved["definitions"]["authors"]["definitions"]["author"]["properties"]["full_name"],
            json!({ "type": "string" })
        );
    }

    #[test]
    fn self_ref_in_inlined_file_points_at_that_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hep.json",
            json!({ "properties": { "tree": { "$ref": "tree.json" } } }),
        );
        write(
            &dir,
            "tree.json",
            json!({
                "$schema": "http://json-schema.org/draft-04/schema#",
                "properties": { "children": { "items": { "$ref": "#" } } }
            }),
        );

        let schema = loaded(&dir, "hep.json");
        let resolved = LocalRefResolver::from_schema(&schema).resolve().unwrap();

        assert_eq!(
            resolved["properties"]["tree"]["properties"]["children"]["items"],
            json!({ "$ref": "#/definitions/tree" })
        );
        assert_eq!(
            resolved["definitions"]["tree"],
            json!({ "properties": { "children": { "items": { "$ref": "#/definitions/tree" } } } })
        );
    }

    #[test]
    fn recursive_definition_in_inlined_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hep.json",
            json!({
                "definitions": { "tree": { "type": "string" } },
                "properties": { "tree": { "$ref": "tree.json" } }
            }),
        );
        write(
            &dir,
            "tree.json",
            json!({
                "$ref": "#/definitions/node",
                "definitions": {
                    "node": {
                        "type": "object",
                        "properties": {
                            "children": { "type": "array", "items": { "$ref": "#/definitions/node" } }
                        }
                    }
                }
            }),
        );

        let schema = loaded(&dir, "hep.json");
        let resolved = LocalRefResolver::from_schema(&schema).resolve().unwrap();

        // The root's own definition keeps its name.
        assert_eq!(resolved["definitions"]["tree"], json!({ "type": "string" }));
        assert_eq!(
            resolved["properties"]["tree"]["$ref"],
            "#/definitions/tree_2/definitions/node"
        );
        assert_eq!(
            resolved["definitions"]["tree_2"]["definitions"]["node"]["properties"]["children"]
                ["items"],
            json!({ "$ref": "#/definitions/tree_2/definitions/node" })
        );
    }

    #[test]
    fn file_without_fragment_refs_is_not_hoisted() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hep.json",
            json!({
                "properties": {
                    "a": { "$ref": "elements/source.json" },
                    "b": { "$ref": "elements/source.json" }
                }
            }),
        );
        write(&dir, "elements/source.json", json!({ "type": "string" }));

        let schema = loaded(&dir, "hep.json");
        let resolved = LocalRefResolver::from_schema(&schema).resolve().unwrap();

        assert_eq!(resolved["properties"]["a"], json!({ "type": "string" }));
        assert_eq!(resolved["properties"]["b"], json!({ "type": "string" }));
        assert!(resolved.get("definitions").is_none());
    }

    #[test]
    fn fragment_of_external_file() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hep.json",
            json!({ "properties": { "year": { "$ref": "elements/common.json#/definitions/year" } } }),
        );
        write(
            &dir,
            "elements/common.json",
            json!({ "definitions": { "year": { "type": "integer", "minimum": 1000 } } }),
        );

        let schema = loaded(&dir, "hep.json");
        let resolved = LocalRefResolver::from_schema(&schema).resolve().unwrap();
        assert_eq!(resolved["properties"]["year"]["minimum"], 1000);
    }

    #[test]
    fn root_fragment_refs_left_for_validator() {
        let dir = TempDir::new().unwrap();
        let document = json!({
            "definitions": { "source": { "type": "string" } },
            "properties": {
                "source": { "$ref": "#/definitions/source" },
                "child": { "$ref": "#" }
            }
        });
        write(&dir, "hep.json", document.clone());

        let schema = loaded(&dir, "hep.json");
        let resolved = LocalRefResolver::from_schema(&schema).resolve().unwrap();
        assert_eq!(resolved, document);
    }

    #[test]
    fn sibling_keys_win_over_inlined_ones() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hep.json",
            json!({ "properties": { "doc": { "$ref": "doc.json", "description": "local" } } }),
        );
        write(&dir, "doc.json", json!({ "type": "string", "description": "shared" }));

        let schema = loaded(&dir, "hep.json");
        let resolved = LocalRefResolver::from_schema(&schema).resolve().unwrap();
        assert_eq!(
            resolved["properties"]["doc"],
            json!({ "description": "local", "type": "string" })
        );
    }

    #[test]
    fn remote_refs_are_refused() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hep.json",
            json!({ "properties": { "x": { "$ref": "https://example.org/x.json" } } }),
        );

        let schema = loaded(&dir, "hep.json");
        let result = LocalRefResolver::from_schema(&schema).resolve();
        assert!(matches!(result, Err(LoadError::RemoteRef { .. })));
    }

    #[test]
    fn missing_ref_target() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "hep.json",
            json!({ "properties": { "x": { "$ref": "elements/nope.json" } } }),
        );

        let schema = loaded(&dir, "hep.json");
        let result = LocalRefResolver::from_schema(&schema).resolve();
        assert!(matches!(result, Err(LoadError::BundleError { .. })));
    }

    #[test]
    fn circular_refs_detected() {
        let dir = TempDir::new().unwrap();
        write(&dir, "hep.json", json!({ "$ref": "a.json" }));
        write(&dir, "a.json", json!({ "properties": { "b": { "$ref": "b.json" } } }));
        write(&dir, "b.json", json!({ "properties": { "a": { "$ref": "a.json" } } }));

        let schema = loaded(&dir, "hep.json");
        let err = LocalRefResolver::from_schema(&schema).resolve().unwrap_err();
        assert!(err.to_string().contains("circular reference"));
    }

    #[test]
    fn resolve_does_not_mutate_loaded_document() {
        let dir = TempDir::new().unwrap();
        write(&dir, "hep.json", json!({ "$ref": "a.json" }));
        write(&dir, "a.json", json!({ "type": "object" }));

        let schema = loaded(&dir, "hep.json");
        let _ = LocalRefResolver::from_schema(&schema).resolve().unwrap();
        assert_eq!(schema.document, json!({ "$ref": "a.json" }));
    }
}
