//! Output formatters for filters.

use clap::ValueEnum;
use comfy_table::Table;
use tql_filter::Predicate;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format the active filters.
    fn format_filters(&self, filters: &[&Predicate]) -> String;

    /// Format a TQL expression.
    fn format_tql(&self, tql: &str) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_filters(&self, filters: &[&Predicate]) -> String {
        if filters.is_empty() {
            return "No filters".to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["#", "Column", "Name", "Type", "Value", "Badge", "Editable"]);

        for (index, predicate) in filters.iter().enumerate() {
            table.add_row(vec![
                (index + 1).to_string(),
                predicate.col_id().to_string(),
                predicate.col_name().to_string(),
                predicate.kind().to_string(),
                predicate.value().labels().join(" | "),
                predicate.badge_class(),
                predicate.editable().to_string(),
            ]);
        }

        table.to_string()
    }

    fn format_tql(&self, tql: &str) -> String {
        if tql.is_empty() {
            "(no filter)".to_string()
        } else {
            tql.to_string()
        }
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl JsonFormatter {
    fn predicate_to_json(predicate: &Predicate) -> serde_json::Value {
        serde_json::json!({
            "type": predicate.kind(),
            "colId": predicate.col_id(),
            "colName": predicate.col_name(),
            "editable": predicate.editable(),
            "badgeClass": predicate.badge_class(),
            "value": predicate.value().labels(),
            "args": predicate.args(),
        })
    }
}

impl Formatter for JsonFormatter {
    fn format_filters(&self, filters: &[&Predicate]) -> String {
        let rows: Vec<_> = filters.iter().map(|p| Self::predicate_to_json(p)).collect();
        serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_tql(&self, tql: &str) -> String {
        serde_json::json!({ "tql": tql }).to_string()
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({ "message": message }).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({ "error": error }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tql_filter::{Criterion, PhraseArgs, PredicateKind, QualityArgs};

    fn sample() -> Vec<Predicate> {
        vec![
            Predicate::new(
                PredicateKind::Exact,
                "0001",
                "firstname",
                PhraseArgs::new(vec![Criterion::new("Charles"), Criterion::new("Lucy")]),
            )
            .unwrap(),
            Predicate::new(PredicateKind::Quality, "0002", "email", QualityArgs::invalid())
                .unwrap(),
        ]
    }

    #[test]
    fn test_table_output() {
        let filters = sample();
        let refs: Vec<_> = filters.iter().collect();
        let output = TableFormatter.format_filters(&refs);
        assert!(output.contains("firstname"));
        assert!(output.contains("Charles | Lucy"));
        assert!(output.contains("invalid"));
        assert_eq!(TableFormatter.format_filters(&[]), "No filters");
        assert_eq!(TableFormatter.format_tql(""), "(no filter)");
    }

    #[test]
    fn test_json_output() {
        let filters = sample();
        let refs: Vec<_> = filters.iter().collect();
        let output = JsonFormatter.format_filters(&refs);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["type"], "exact");
        assert_eq!(value[0]["value"], serde_json::json!(["Charles", "Lucy"]));
        assert_eq!(value[1]["badgeClass"], "invalid");
        assert_eq!(value[1]["args"]["invalid"], true);

        let tql: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_tql("(0001 is valid)")).unwrap();
        assert_eq!(tql["tql"], "(0001 is valid)");
    }
}
