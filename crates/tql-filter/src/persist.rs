//! Persisted filter records.

use crate::error::{FilterError, Result};
use crate::model::{Predicate, PredicateArgs, PredicateKind};
use serde::{Deserialize, Serialize};

/// A filter as kept in storage: `{type, colId, colName, args}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawStoredFilter")]
pub struct StoredFilter {
    #[serde(rename = "type")]
    pub kind: PredicateKind,
    pub col_id: String,
    pub col_name: String,
    pub args: PredicateArgs,
}

/// Wire form; `args` are decoded once the type is known.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStoredFilter {
    #[serde(rename = "type")]
    kind: PredicateKind,
    col_id: String,
    #[serde(default)]
    col_name: String,
    args: serde_json::Value,
}

impl TryFrom<RawStoredFilter> for StoredFilter {
    type Error = FilterError;

    fn try_from(raw: RawStoredFilter) -> Result<Self> {
        Ok(Self {
            args: PredicateArgs::from_json_value(raw.kind, raw.args)?,
            kind: raw.kind,
            col_id: raw.col_id,
            col_name: raw.col_name,
        })
    }
}

impl StoredFilter {
    /// Decode a JSON array of stored filters.
    pub fn list_from_json(json: &str) -> Result<Vec<StoredFilter>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode stored filters as pretty JSON.
    pub fn list_to_json(filters: &[StoredFilter]) -> Result<String> {
        Ok(serde_json::to_string_pretty(filters)?)
    }
}

impl From<&Predicate> for StoredFilter {
    fn from(predicate: &Predicate) -> Self {
        Self {
            kind: predicate.kind(),
            col_id: predicate.col_id().to_string(),
            col_name: predicate.col_name().to_string(),
            args: predicate.args().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Criterion, PhraseArgs, QualityArgs};

    #[test]
    fn test_decode_by_type() {
        let filters = StoredFilter::list_from_json(
            r#"[
                {"type": "exact", "colId": "0001", "colName": "firstname",
                 "args": {"phrase": [{"value": "Charles"}]}},
                {"type": "quality", "colId": "0002", "args": {"empty": true}}
            ]"#,
        )
        .unwrap();

        assert_eq!(filters[0].kind, PredicateKind::Exact);
        let phrase = filters[0].args.criteria().unwrap();
        assert_eq!(phrase[0].value, "Charles");
        assert_eq!(phrase[0].label, None);

        assert_eq!(filters[1].col_name, "");
        assert_eq!(filters[1].args, PredicateArgs::Quality(QualityArgs::empty()));
    }

    #[test]
    fn test_args_must_match_type() {
        let err = StoredFilter::list_from_json(
            r#"[{"type": "inside_range", "colId": "0001", "args": {"phrase": []}}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, FilterError::Json(_)));
    }

    #[test]
    fn test_export_and_reload() {
        let predicate = Predicate::new(
            PredicateKind::Contains,
            "0001",
            "firstname",
            PhraseArgs::new(vec![Criterion::new("it's")]).case_insensitive(),
        )
        .unwrap();
        let stored = vec![StoredFilter::from(&predicate)];
        let json = StoredFilter::list_to_json(&stored).unwrap();
        assert!(json.contains("\"type\": \"contains\""));
        assert!(json.contains("\"caseSensitive\": false"));
        assert_eq!(StoredFilter::list_from_json(&json).unwrap(), stored);
    }
}
