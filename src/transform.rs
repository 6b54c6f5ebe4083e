//! Per-record transforms.
//!
//! A transform maps one input line to one output line: decode, project,
//! re-encode. Transforms are pure and injected into pipelines; a failure on
//! any line is fatal for the whole invocation (no skip-and-continue).

use serde_json::Value;

use crate::error::TransformError;

/// One-line-in, one-line-out record transform.
pub trait RecordTransform: Send + Sync {
    /// Transform a single decoded text line into a single output line.
    /// The returned line must not contain embedded newlines.
    fn apply(&self, line: &str) -> Result<String, TransformError>;
}

/// Projects one top-level field out of each JSON record.
///
/// `{"actor":"a1","other":1}` with field `actor` becomes `"a1"`.
#[derive(Debug, Clone)]
pub struct FieldProjection {
    field: String,
}

impl FieldProjection {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// The projected field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The equivalent `jq` filter expression, used by the external-filter
    /// pipeline variant.
    pub fn jq_filter(&self) -> String {
        format!(".{}", self.field)
    }
}

impl RecordTransform for FieldProjection {
    fn apply(&self, line: &str) -> Result<String, TransformError> {
        let record: Value = serde_json::from_str(line).map_err(TransformError::Decode)?;
        let value = record
            .get(&self.field)
            .ok_or_else(|| TransformError::MissingField(self.field.clone()))?;
        serde_json::to_string(value).map_err(TransformError::Encode)
    }
}
