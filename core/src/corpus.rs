use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A field holds either one string or a list of strings (e.g. `keywords`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Flatten to a single searchable string; list items joined by spaces in order.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(" "),
        }
    }
}

/// One corpus record. Identity is the record's ordinal in the snapshot, kept
/// by the caller; the document itself is just its fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: BTreeMap<String, FieldValue>,
}

impl Document {
    /// Build a document from a raw corpus record. Non-text values (numbers,
    /// nulls, nested objects) are treated as empty content, never an error.
    pub fn from_value(value: &serde_json::Value) -> Document {
        let mut fields = BTreeMap::new();
        if let Some(map) = value.as_object() {
            for (name, v) in map {
                match serde_json::from_value::<FieldValue>(v.clone()) {
                    Ok(fv) => {
                        fields.insert(name.clone(), fv);
                    }
                    Err(_) => {
                        tracing::debug!(field = %name, "skipping non-text field value");
                    }
                }
            }
        }
        Document { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Flattened text of one field; `None` when the field is missing.
    pub fn field_text(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(FieldValue::to_text)
    }
}

/// Field name -> positive importance weight. Fields absent from the table are
/// ignored during indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldWeights(BTreeMap<String, f64>);

impl Default for FieldWeights {
    fn default() -> Self {
        let table = [
            ("full_name", 3.25),
            ("genre", 3.0),
            ("keywords", 2.5),
            ("publisher", 2.0),
            ("description", 1.0),
            ("platform", 1.5),
            ("datePublished", 2.5),
            ("metascore", 0.8),
        ];
        FieldWeights(
            table
                .into_iter()
                .map(|(name, w)| (name.to_string(), w))
                .collect(),
        )
    }
}

impl FieldWeights {
    pub fn get(&self, field: &str) -> Option<f64> {
        self.0.get(field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, w)| (name.as_str(), *w))
    }

    /// Load a weight table from a JSON object file, rejecting non-positive weights.
    pub fn from_file(path: &Path) -> Result<FieldWeights> {
        let file = File::open(path)
            .with_context(|| format!("opening field weights {}", path.display()))?;
        let weights: FieldWeights = serde_json::from_reader(BufReader::new(file))?;
        for (name, w) in weights.iter() {
            if !(w > 0.0) {
                bail!("field weight for {name:?} must be positive, got {w}");
            }
        }
        Ok(weights)
    }
}

/// Read one corpus file: a JSON array (or single object) for `.json`, one
/// record per line for `.jsonl`. Returns raw records so callers can keep them
/// for display alongside the indexed [`Document`] form.
pub fn read_corpus_file(path: &Path) -> Result<Vec<serde_json::Value>> {
    let file =
        File::open(path).with_context(|| format!("opening corpus file {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    if path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
    } else {
        let json: serde_json::Value = serde_json::from_reader(reader)?;
        match json {
            serde_json::Value::Array(arr) => records.extend(arr),
            other => records.push(other),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_fields_join_in_order() {
        let doc = Document::from_value(&json!({"keywords": ["space", "shooter"]}));
        assert_eq!(doc.field_text("keywords").as_deref(), Some("space shooter"));
    }

    #[test]
    fn malformed_values_become_empty() {
        let doc = Document::from_value(&json!({"metascore": 97, "full_name": "Halo"}));
        assert_eq!(doc.field_text("metascore"), None);
        assert_eq!(doc.field_text("full_name").as_deref(), Some("Halo"));
    }
}
