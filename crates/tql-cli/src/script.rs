//! Filter-action scripts.
//!
//! One action per line:
//!
//! ```text
//! add exact 0001 {"phrase": [{"value": "Charles"}]}
//! add exact 0001 {"phrase": [{"value": "Lucy"}]} ctrl
//! add inside_range 0003 {"intervals": [{"value": [25, 30]}]} shift
//! remove exact 0001
//! load (0001 is invalid)
//! clear
//! tql
//! list
//! ```

use crate::formatter::Formatter;
use thiserror::Error;
use tql_filter::{
    FilterChange, FilterEngine, FilterError, FilterRequest, PredicateArgs, PredicateKey,
    PredicateKind,
};
use tracing::debug;

/// Script errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Malformed action line.
    #[error("{0}")]
    Syntax(String),

    /// Malformed TQL, rendered with its source excerpt.
    #[error("{0}")]
    Tql(String),

    /// Filter engine error.
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// A parsed script line.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add {
        kind: PredicateKind,
        col_id: String,
        args: serde_json::Value,
        key: Option<String>,
    },
    Remove {
        kind: PredicateKind,
        col_id: String,
    },
    Clear,
    Load(String),
    Tql,
    List,
}

/// Lines of a script that carry an action: trimmed, without blanks or
/// `#` comments, with their 1-based line numbers.
pub fn statements(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parse one action line.
pub fn parse_action(line: &str) -> Result<Action, ScriptError> {
    let line = line.trim();
    let (command, rest) = split_word(line);

    match command.to_lowercase().as_str() {
        "add" => {
            let (kind, rest) = split_word(rest);
            let (col_id, rest) = split_word(rest);
            if col_id.is_empty() {
                return Err(usage("add <type> <colId> <json-args> [key]"));
            }
            let kind: PredicateKind = kind.parse()?;

            let mut values =
                serde_json::Deserializer::from_str(rest).into_iter::<serde_json::Value>();
            let args = match values.next() {
                Some(Ok(value)) => value,
                Some(Err(e)) => {
                    return Err(ScriptError::Syntax(format!("invalid arguments: {}", e)));
                }
                None => return Err(usage("add <type> <colId> <json-args> [key]")),
            };
            let key = rest[values.byte_offset()..].trim();

            Ok(Action::Add {
                kind,
                col_id: col_id.to_string(),
                args,
                key: (!key.is_empty()).then(|| key.to_string()),
            })
        }
        "remove" => {
            let (kind, rest) = split_word(rest);
            let (col_id, rest) = split_word(rest);
            if col_id.is_empty() || !rest.is_empty() {
                return Err(usage("remove <type> <colId>"));
            }
            Ok(Action::Remove {
                kind: kind.parse()?,
                col_id: col_id.to_string(),
            })
        }
        "load" => Ok(Action::Load(rest.to_string())),
        "clear" => Ok(Action::Clear),
        "tql" => Ok(Action::Tql),
        "list" => Ok(Action::List),
        other => Err(ScriptError::Syntax(format!(
            "unknown action '{}'. Use: add, remove, load, clear, tql, list",
            other
        ))),
    }
}

/// Run one action against the engine and return its formatted output.
pub fn execute(
    engine: &mut FilterEngine,
    action: Action,
    formatter: &dyn Formatter,
) -> Result<String, ScriptError> {
    debug!(?action, "Executing action");
    match action {
        Action::Add {
            kind,
            col_id,
            args,
            key,
        } => {
            let args = PredicateArgs::from_json_value(kind, args)?;
            let modifier = engine.config().modifier_for(key.as_deref());
            let col_name = engine.columns().display_name(&col_id);
            let request = FilterRequest::new(kind, col_id, col_name, args).with_modifier(modifier);
            let message = match engine.add_filter(request)? {
                FilterChange::Added(key) => format!("added {}", key),
                FilterChange::Updated(key) => format!("updated {}", key),
                FilterChange::Removed(key) => format!("removed {}", key),
            };
            Ok(formatter.format_message(&message))
        }
        Action::Remove { kind, col_id } => {
            let removed = engine.remove_filter(&PredicateKey::new(col_id, kind))?;
            Ok(formatter.format_message(&format!("removed {}", removed.key())))
        }
        Action::Clear => {
            let count = engine.remove_all_filters();
            Ok(formatter.format_message(&format!("removed {} filter(s)", count)))
        }
        Action::Load(text) => {
            let count = engine.load_tql(&text).map_err(|e| match e {
                FilterError::Parse(parse) => ScriptError::Tql(parse.format_with_source(&text)),
                other => ScriptError::Filter(other),
            })?;
            Ok(formatter.format_message(&format!("loaded {} filter(s)", count)))
        }
        Action::Tql => Ok(formatter.format_tql(&engine.to_tql())),
        Action::List => {
            let filters: Vec<_> = engine.filters().collect();
            Ok(formatter.format_filters(&filters))
        }
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(index) => (&input[..index], input[index..].trim_start()),
        None => (input, ""),
    }
}

fn usage(usage: &str) -> ScriptError {
    ScriptError::Syntax(format!("usage: {}", usage))
}
