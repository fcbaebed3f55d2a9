//! Value escaping and range label formatting.
//!
//! Criteria keep two forms of the same text: `value` is the raw text used for
//! comparison and merging, `label` is the escaped form shown on badges.
//! TQL literals are encoded from `value` with [`quote_literal`], which the
//! lexer of `tql-lang` decodes back to the same raw text.

use chrono::{FixedOffset, TimeZone};

/// Separator between range bounds in labels.
pub const DEFAULT_RANGE_SEPARATOR: &str = " .. ";

/// Escape newlines and single quotes for a badge label.
///
/// A quote already preceded by an odd number of backslashes counts as
/// escaped, so `escape(escape(s)) == escape(s)`.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut odd_backslashes = false;

    for c in raw.chars() {
        match c {
            '\n' => {
                out.push_str("\\n");
                odd_backslashes = false;
            }
            '\'' => {
                if !odd_backslashes {
                    out.push('\\');
                }
                out.push('\'');
                odd_backslashes = false;
            }
            '\\' => {
                out.push('\\');
                odd_backslashes = !odd_backslashes;
            }
            _ => {
                out.push(c);
                odd_backslashes = false;
            }
        }
    }

    out
}

/// Encode raw text as a single-quoted TQL literal. Backslashes, quotes and
/// newlines are all escaped, so any raw value survives a parse.
pub fn quote_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('\'');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Format a number the way it appears in labels and TQL.
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // normalizes -0
        return "0".to_string();
    }
    n.to_string()
}

/// How range bounds are rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundFormat {
    /// Plain numbers.
    Number,
    /// Epoch milliseconds rendered as local dates with a strftime pattern.
    Date {
        pattern: &'static str,
        offset: FixedOffset,
    },
}

/// Range label formatting: bound rendering plus separator.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelFormat {
    pub bounds: BoundFormat,
    pub separator: String,
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self::number()
    }
}

impl LabelFormat {
    /// Numeric bounds with the default separator.
    pub fn number() -> Self {
        Self {
            bounds: BoundFormat::Number,
            separator: DEFAULT_RANGE_SEPARATOR.to_string(),
        }
    }

    /// Date bounds in `offset` local time.
    pub fn date(pattern: &'static str, offset: FixedOffset) -> Self {
        Self {
            bounds: BoundFormat::Date { pattern, offset },
            separator: DEFAULT_RANGE_SEPARATOR.to_string(),
        }
    }

    /// Set the separator.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Render one bound.
    pub fn bound(&self, value: f64) -> String {
        match &self.bounds {
            BoundFormat::Number => format_number(value),
            BoundFormat::Date { pattern, offset } => offset
                .timestamp_millis_opt(value as i64)
                .single()
                .map(|dt| dt.format(pattern).to_string())
                .unwrap_or_else(|| format_number(value)),
        }
    }

    /// Label for `[min, max]`: `[x]` for a single point, otherwise
    /// `[min .. max]`, or `[min .. max[` when the upper bound is excluded.
    pub fn range_label(&self, min: f64, max: f64, exclude_max: bool) -> String {
        let lower = self.bound(min);
        if min == max {
            return format!("[{}]", lower);
        }
        let closing = if exclude_max { '[' } else { ']' };
        format!("[{}{}{}{}", lower, self.separator, self.bound(max), closing)
    }
}
