//! A small, safe predicate language for branch and filter nodes.
//!
//! Operators: `contains`, `excludes`, `equals`, `starts-with`, `ends-with`,
//! `regex`, `min-length`, `greater-than`, `less-than`, `is-empty`.
//!
//! Conditions are described with data in the node config rather than code:
//!
//! ```text
//! { "condition": "contains", "value": "error", "case_sensitive": false }
//! { "condition": { "any": [ { "op": "starts-with", "value": "#" },
//!                           { "op": "is-empty" } ] } }
//! ```

use crate::workflow::{Config, Value};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeMap;

/// A text needle with its case sensitivity resolved up front.
#[derive(Debug, Clone)]
pub struct TextMatch {
    needle: String,
    case_sensitive: bool,
}

impl TextMatch {
    fn new(needle: &str, case_sensitive: bool) -> Self {
        let needle = if case_sensitive {
            needle.to_string()
        } else {
            needle.to_lowercase()
        };
        Self {
            needle,
            case_sensitive,
        }
    }

    fn prepare(&self, haystack: &str) -> String {
        if self.case_sensitive {
            haystack.to_string()
        } else {
            haystack.to_lowercase()
        }
    }
}

/// A parsed condition.
#[derive(Debug, Clone)]
pub enum Predicate {
    Contains(TextMatch),
    Equals(TextMatch),
    StartsWith(TextMatch),
    EndsWith(TextMatch),
    Regex(Regex),
    MinLength(usize),
    GreaterThan(f64),
    LessThan(f64),
    IsEmpty,
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Reads the predicate from a node config's `condition` entry.
    ///
    /// A missing condition means "contains the empty string", which matches
    /// everything.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let case_sensitive = config.get_bool("case_sensitive").unwrap_or(false);
        match config.get("condition") {
            None => Ok(Predicate::Contains(TextMatch::new("", case_sensitive))),
            Some(Value::Text(op)) => Self::from_op(op, config.get("value"), case_sensitive),
            Some(Value::Map(spec)) => Self::from_spec(spec, case_sensitive),
            Some(other) => Err(format!(
                "'condition' must be an operator name or an object, found {}",
                other.type_name()
            )),
        }
    }

    fn from_spec(spec: &BTreeMap<String, Value>, inherited_case: bool) -> Result<Self, String> {
        if let Some(children) = spec.get("all") {
            return Ok(Predicate::All(Self::from_list(children, inherited_case)?));
        }
        if let Some(children) = spec.get("any") {
            return Ok(Predicate::Any(Self::from_list(children, inherited_case)?));
        }
        if let Some(inner) = spec.get("not") {
            let inner = inner
                .as_map()
                .ok_or_else(|| "'not' expects an object".to_string())?;
            return Ok(Predicate::Not(Box::new(Self::from_spec(inner, inherited_case)?)));
        }

        let op = spec
            .get("op")
            .and_then(Value::as_str)
            .ok_or_else(|| "condition object needs an 'op', 'all', 'any' or 'not' entry".to_string())?;
        let case_sensitive = spec
            .get("case_sensitive")
            .and_then(Value::as_bool)
            .unwrap_or(inherited_case);
        Self::from_op(op, spec.get("value"), case_sensitive)
    }

    fn from_list(children: &Value, case_sensitive: bool) -> Result<Vec<Self>, String> {
        let items = children
            .as_list()
            .ok_or_else(|| "'all' and 'any' expect a list of conditions".to_string())?;
        items
            .iter()
            .map(|item| {
                item.as_map()
                    .ok_or_else(|| "each nested condition must be an object".to_string())
                    .and_then(|spec| Self::from_spec(spec, case_sensitive))
            })
            .collect()
    }

    fn from_op(op: &str, value: Option<&Value>, case_sensitive: bool) -> Result<Self, String> {
        let text = || value.map(Value::to_text).unwrap_or_default();
        let number = || {
            value
                .and_then(Value::to_number)
                .ok_or_else(|| format!("operator '{}' needs a numeric 'value'", op))
        };

        match op {
            "contains" => Ok(Predicate::Contains(TextMatch::new(&text(), case_sensitive))),
            "excludes" => Ok(Predicate::Not(Box::new(Predicate::Contains(TextMatch::new(
                &text(),
                case_sensitive,
            ))))),
            "equals" => Ok(Predicate::Equals(TextMatch::new(&text(), case_sensitive))),
            "starts-with" | "startsWith" => {
                Ok(Predicate::StartsWith(TextMatch::new(&text(), case_sensitive)))
            }
            "ends-with" | "endsWith" => {
                Ok(Predicate::EndsWith(TextMatch::new(&text(), case_sensitive)))
            }
            "regex" => RegexBuilder::new(&text())
                .case_insensitive(!case_sensitive)
                .build()
                .map(Predicate::Regex)
                .map_err(|e| format!("invalid regex pattern: {}", e)),
            "min-length" | "length" => {
                let n = number()?;
                if n < 0.0 {
                    return Err("'min-length' cannot be negative".to_string());
                }
                Ok(Predicate::MinLength(n as usize))
            }
            "greater-than" => Ok(Predicate::GreaterThan(number()?)),
            "less-than" => Ok(Predicate::LessThan(number()?)),
            "is-empty" => Ok(Predicate::IsEmpty),
            other => Err(format!("unknown condition operator '{}'", other)),
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Predicate::Contains(m) => m.prepare(&value.to_text()).contains(&m.needle),
            Predicate::Equals(m) => m.prepare(&value.to_text()) == m.needle,
            Predicate::StartsWith(m) => m.prepare(&value.to_text()).starts_with(&m.needle),
            Predicate::EndsWith(m) => m.prepare(&value.to_text()).ends_with(&m.needle),
            Predicate::Regex(re) => re.is_match(&value.to_text()),
            Predicate::MinLength(n) => value.to_text().chars().count() >= *n,
            Predicate::GreaterThan(n) => value.to_number().is_some_and(|v| v > *n),
            Predicate::LessThan(n) => value.to_number().is_some_and(|v| v < *n),
            Predicate::IsEmpty => match value {
                Value::Null => true,
                Value::Text(s) => s.trim().is_empty(),
                Value::List(items) => items.is_empty(),
                Value::Map(map) => map.is_empty(),
                _ => false,
            },
            Predicate::All(children) => children.iter().all(|p| p.matches(value)),
            Predicate::Any(children) => children.iter().any(|p| p.matches(value)),
            Predicate::Not(inner) => !inner.matches(value),
        }
    }
}
