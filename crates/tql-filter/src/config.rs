//! Filter engine configuration.

use crate::catalog::{ColumnMetadata, ColumnType, DAY_PATTERN};
use crate::engine::Modifier;
use crate::error::Result;
use crate::escape::{LabelFormat, DEFAULT_RANGE_SEPARATOR};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Default UTC offset of the user's calendar, in minutes.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 0;

/// Keys that request an OR-merge into an existing filter.
pub const DEFAULT_MULTI_SELECT_KEYS: &[&str] = &["ctrl", "meta"];

/// Keys that request a range extension.
pub const DEFAULT_EXTEND_RANGE_KEYS: &[&str] = &["shift"];

/// Filter engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    /// Offset of the user's local time from UTC, used to shift date bounds.
    pub utc_offset_minutes: i32,

    /// Separator between bounds in range labels.
    pub range_separator: String,

    /// Key names mapped to [`Modifier::MultiSelect`].
    pub multi_select_keys: Vec<String>,

    /// Key names mapped to [`Modifier::ExtendRange`].
    pub extend_range_keys: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterConfig {
    /// Create a configuration with the default values.
    pub fn new() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            range_separator: DEFAULT_RANGE_SEPARATOR.to_string(),
            multi_select_keys: DEFAULT_MULTI_SELECT_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            extend_range_keys: DEFAULT_EXTEND_RANGE_KEYS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }

    /// Decode a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the UTC offset in minutes.
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Set the range label separator.
    pub fn with_range_separator(mut self, separator: impl Into<String>) -> Self {
        self.range_separator = separator.into();
        self
    }

    /// Set the multi-select key names.
    pub fn with_multi_select_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.multi_select_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the extend-range key names.
    pub fn with_extend_range_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extend_range_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// The configured offset. Out-of-range values fall back to UTC.
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    /// Map the key held during a UI action to a modifier.
    pub fn modifier_for(&self, key: Option<&str>) -> Modifier {
        let Some(key) = key else {
            return Modifier::None;
        };
        if self
            .multi_select_keys
            .iter()
            .any(|k| k.eq_ignore_ascii_case(key))
        {
            Modifier::MultiSelect
        } else if self
            .extend_range_keys
            .iter()
            .any(|k| k.eq_ignore_ascii_case(key))
        {
            Modifier::ExtendRange
        } else {
            Modifier::None
        }
    }

    /// Range label format for a column. Date columns use the pattern of
    /// their histogram pace; everything else is numeric.
    pub fn label_format(
        &self,
        column: Option<&ColumnMetadata>,
        column_type: ColumnType,
    ) -> LabelFormat {
        let format = if column_type.is_date() {
            let pattern = column.map(|c| c.date_pattern()).unwrap_or(DAY_PATTERN);
            LabelFormat::date(pattern, self.utc_offset())
        } else {
            LabelFormat::number()
        };
        format.with_separator(self.range_separator.clone())
    }
}
