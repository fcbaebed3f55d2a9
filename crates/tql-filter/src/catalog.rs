//! Column catalog consumed by the resolver and the engine.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Data type of a column, as reported by the dataset metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Double,
    Float,
    Decimal,
    Boolean,
    Date,
    /// Any type the filter engine does not treat specially.
    #[default]
    #[serde(other)]
    Other,
}

impl ColumnType {
    /// Check if range bounds on this column are dates.
    pub fn is_date(&self) -> bool {
        matches!(self, ColumnType::Date)
    }

    /// Check if this is a numeric type.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::Double | ColumnType::Float | ColumnType::Decimal
        )
    }
}

/// Histogram pace of a date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatePace {
    Century,
    Decade,
    Year,
    HalfYear,
    Quarter,
    Month,
    Week,
    Day,
    #[serde(other)]
    Unknown,
}

impl DatePace {
    /// strftime pattern used for range labels at this pace.
    pub fn label_pattern(&self) -> &'static str {
        match self {
            DatePace::Century | DatePace::Decade | DatePace::Year => "%Y",
            DatePace::HalfYear | DatePace::Quarter | DatePace::Month => "%b %Y",
            DatePace::Week | DatePace::Day | DatePace::Unknown => DAY_PATTERN,
        }
    }
}

/// Label pattern for date columns without a known pace.
pub const DAY_PATTERN: &str = "%Y-%m-%d";

/// Histogram pace: a numeric bucket width or a calendar unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pace {
    Step(f64),
    Calendar(DatePace),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Histogram {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace: Option<Pace>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
}

/// Metadata of one dataset column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    /// Stable column identifier (`0001`).
    pub id: String,
    /// Display name; empty when the dataset does not provide one.
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ColumnStatistics>,
}

impl ColumnMetadata {
    /// Create a column with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            column_type: ColumnType::Other,
            statistics: None,
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the column type.
    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    /// Set the histogram pace.
    pub fn with_pace(mut self, pace: Pace) -> Self {
        self.statistics = Some(ColumnStatistics {
            histogram: Some(Histogram { pace: Some(pace) }),
        });
        self
    }

    /// Calendar pace of the column histogram, if any.
    pub fn date_pace(&self) -> Option<DatePace> {
        match self.statistics.as_ref()?.histogram.as_ref()?.pace? {
            Pace::Calendar(pace) => Some(pace),
            Pace::Step(_) => None,
        }
    }

    /// strftime pattern for date range labels on this column.
    pub fn date_pattern(&self) -> &'static str {
        self.date_pace()
            .map(|pace| pace.label_pattern())
            .unwrap_or(DAY_PATTERN)
    }
}

/// Read-only lookup over the dataset columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnCatalog {
    columns: Vec<ColumnMetadata>,
}

impl ColumnCatalog {
    /// Create a catalog from column metadata.
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        Self { columns }
    }

    /// Decode a JSON array of columns.
    pub fn from_json(json: &str) -> Result<Self> {
        let columns: Vec<ColumnMetadata> = serde_json::from_str(json)?;
        Ok(Self::new(columns))
    }

    /// Find a column by id.
    pub fn find(&self, id: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Display name for a column, falling back to its id when the column is
    /// unknown or unnamed.
    pub fn display_name(&self, id: &str) -> String {
        match self.find(id) {
            Some(column) if !column.name.is_empty() => column.name.clone(),
            Some(_) => id.to_string(),
            None => {
                debug!(col_id = id, "Column missing from catalog, using id as name");
                id.to_string()
            }
        }
    }

    /// Type of a column; unknown columns are `Other`.
    pub fn column_type(&self, id: &str) -> ColumnType {
        self.find(id).map(|c| c.column_type).unwrap_or_default()
    }

    /// Iterate over the columns.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl From<Vec<ColumnMetadata>> for ColumnCatalog {
    fn from(columns: Vec<ColumnMetadata>) -> Self {
        Self::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_json() {
        let catalog = ColumnCatalog::from_json(
            r#"[
                {"id": "0001", "name": "firstname", "type": "string"},
                {"id": "0002", "name": "birth", "type": "date",
                 "statistics": {"histogram": {"pace": "MONTH"}}},
                {"id": "0003", "name": "age", "type": "integer",
                 "statistics": {"histogram": {"pace": 10}}},
                {"id": "0004"}
            ]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.display_name("0001"), "firstname");
        assert_eq!(catalog.column_type("0002"), ColumnType::Date);
        assert_eq!(catalog.find("0002").unwrap().date_pace(), Some(DatePace::Month));
        assert_eq!(catalog.find("0002").unwrap().date_pattern(), "%b %Y");
        assert_eq!(catalog.find("0003").unwrap().date_pace(), None);
        assert!(catalog.column_type("0003").is_numeric());
        assert_eq!(catalog.column_type("0004"), ColumnType::Other);
    }

    #[test]
    fn test_missing_column_falls_back_to_id() {
        let catalog = ColumnCatalog::new(vec![ColumnMetadata::new("0001")]);
        assert_eq!(catalog.display_name("0001"), "0001");
        assert_eq!(catalog.display_name("0009"), "0009");
        assert_eq!(catalog.column_type("0009"), ColumnType::Other);
    }

    #[test]
    fn test_unknown_type_and_pace() {
        let column: ColumnMetadata = serde_json::from_str(
            r#"{"id": "0005", "type": "localized_text",
                "statistics": {"histogram": {"pace": "FORTNIGHT"}}}"#,
        )
        .unwrap();
        assert_eq!(column.column_type, ColumnType::Other);
        assert_eq!(column.date_pace(), Some(DatePace::Unknown));
        assert_eq!(column.date_pattern(), DAY_PATTERN);
    }
}
