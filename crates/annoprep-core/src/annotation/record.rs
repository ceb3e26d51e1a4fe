//! Serde model of a Label Studio JSON export.
//!
//! Only the fields the pipelines read are modelled; everything else in the
//! export is ignored.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{AnnoprepError, Result};

/// One task of the export.
#[derive(Debug, Clone, Deserialize)]
pub struct Example {
    /// Task id assigned by the annotation tool (numeric or string).
    #[serde(default)]
    pub id: Option<Value>,

    /// Task attributes keyed by field name (e.g. `text`, `REPORT`).
    pub data: Map<String, Value>,

    /// Number of completed annotation passes on this task.
    #[serde(default)]
    pub total_annotations: Option<u64>,

    /// Annotation passes; only the first one is read.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// One annotation pass over a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Annotation {
    #[serde(default)]
    pub result: Vec<ResultItem>,
}

/// One item of an annotation result list.
///
/// Label spans carry a `value` payload; relation edges carry `from_id` and
/// `to_id` instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub value: Option<ResultValue>,
    #[serde(default)]
    pub from_id: Option<String>,
    #[serde(default)]
    pub to_id: Option<String>,
}

/// Payload of a label span.
///
/// The exported `end` offset is not read: entity ends are recomputed from
/// the trimmed span text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultValue {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Example {
    /// Returns the text stored under `field_name`.
    ///
    /// # Errors
    ///
    /// Returns `AnnoprepError::MalformedExample` if the field is absent or
    /// not a string.
    pub fn text(&self, field_name: &str, index: usize) -> Result<&str> {
        match self.data.get(field_name) {
            Some(Value::String(text)) => Ok(text),
            Some(other) => Err(AnnoprepError::malformed(
                index,
                format!("field {field_name:?} is not a string: {other}"),
            )),
            None => Err(AnnoprepError::malformed(
                index,
                format!("field {field_name:?} not found in data"),
            )),
        }
    }

    /// Returns the result list of the first annotation pass.
    ///
    /// # Errors
    ///
    /// Returns `AnnoprepError::MalformedExample` if the task has no annotation.
    pub fn first_result(&self, index: usize) -> Result<&[ResultItem]> {
        self.annotations
            .first()
            .map(|a| a.result.as_slice())
            .ok_or_else(|| AnnoprepError::malformed(index, "no annotations"))
    }

    /// The task id rendered as text, if present.
    pub fn task_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(id) => Some(id.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl ResultValue {
    /// First label of the span. Any further labels are dropped.
    pub fn first_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }
}

/// Reads an export (a JSON array of tasks) from any reader.
pub fn read_examples<R: Read>(reader: R) -> Result<Vec<Example>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Reads an export from a file.
pub fn load_examples<P: AsRef<Path>>(path: P) -> Result<Vec<Example>> {
    let file = File::open(path.as_ref())?;
    let examples = read_examples(BufReader::new(file))?;
    info!(path = %path.as_ref().display(), count = examples.len(), "loaded annotation export");
    Ok(examples)
}
