//! Dataset loading and request payload derivation.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One dataset entry. Identity is its position in the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestItem {
    pub label: String,
    /// Opaque extraction schema, forwarded unchanged.
    pub extraction_schema: serde_json::Value,
    pub pdf_path: String,
}

/// Outbound JSON body for one [`RequestItem`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSpec<'a> {
    pub label: &'a str,
    pub extraction_schema: &'a serde_json::Value,
    pub pdf_path: String,
}

impl<'a> RequestSpec<'a> {
    /// Build the payload, joining `prefix` in front of the item's `pdf_path`.
    pub fn from_item(item: &'a RequestItem, prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let pdf_path = if prefix.is_empty() {
            item.pdf_path.clone()
        } else {
            format!("{}/{}", prefix, item.pdf_path)
        };
        Self {
            label: &item.label,
            extraction_schema: &item.extraction_schema,
            pdf_path,
        }
    }
}

/// Read and validate a dataset file.
pub async fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<RequestItem>> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        let msg = if e.kind() == std::io::ErrorKind::NotFound {
            format!("dataset file {} not found", path.display())
        } else {
            format!("failed to read dataset file {}", path.display())
        };
        Error::dataset_with_context(
            msg,
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("dataset_loader"),
        )
    })?;

    let items = parse_dataset(&content)?;
    info!(path = %path.display(), items = items.len(), "dataset loaded");
    Ok(items)
}

/// Parse dataset JSON: an array of `{label, extraction_schema, pdf_path}`.
pub fn parse_dataset(content: &str) -> Result<Vec<RequestItem>> {
    let doc: serde_json::Value = serde_json::from_str(content).map_err(|e| {
        Error::dataset_with_context(
            "failed to decode dataset JSON",
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("dataset_loader"),
        )
    })?;

    let entries = match doc {
        serde_json::Value::Array(entries) => entries,
        other => {
            return Err(Error::dataset_with_context(
                "dataset must be a JSON array",
                ErrorContext::new()
                    .with_details(format!("found {}", json_kind(&other)))
                    .with_source("dataset_loader"),
            ))
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| parse_entry(i, entry))
        .collect()
}

fn parse_entry(index: usize, entry: serde_json::Value) -> Result<RequestItem> {
    if entry
        .get("extraction_schema")
        .map_or(false, |v| v.is_null())
    {
        return Err(Error::dataset_with_context(
            "extraction_schema must not be null",
            ErrorContext::new()
                .with_field_path(format!("dataset[{}].extraction_schema", index))
                .with_source("dataset_loader"),
        ));
    }
    serde_json::from_value(entry).map_err(|e| {
        Error::dataset_with_context(
            "invalid dataset entry",
            ErrorContext::new()
                .with_field_path(format!("dataset[{}]", index))
                .with_details(e.to_string())
                .with_source("dataset_loader"),
        )
    })
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
