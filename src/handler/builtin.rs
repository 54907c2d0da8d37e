use super::predicate::Predicate;
use super::{Arity, HandlerRegistry, NodeHandler};
use crate::error::HandlerError;
use crate::workflow::{Config, Value};
use futures::future::{self, BoxFuture};
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

fn ready<'a>(result: Result<Value, HandlerError>) -> BoxFuture<'a, Result<Value, HandlerError>> {
    Box::pin(future::ready(result))
}

fn single(inbound: Vec<Value>) -> Value {
    inbound.into_iter().next().unwrap_or_default()
}

fn mismatch(operation: &str, expected: &str, found: Value) -> HandlerError {
    HandlerError::TypeMismatch {
        operation: operation.to_string(),
        expected: expected.to_string(),
        found,
    }
}

fn choice<'a>(config: &'a Config, key: &str, default: &'a str, allowed: &[&str]) -> Result<&'a str, String> {
    let value = config.get_str(key).unwrap_or(default);
    if allowed.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "'{}' must be one of [{}], found '{}'",
            key,
            allowed.join(", "),
            value
        ))
    }
}

// --- Text operations ---

/// An element-wise text operation.
#[derive(Debug, Clone)]
pub enum TextOp {
    Uppercase,
    Lowercase,
    Trim,
    Prefix(String),
    Suffix(String),
    Template(String),
    Length,
    Number,
}

impl TextOp {
    const NAMES: [&'static str; 8] = [
        "uppercase", "lowercase", "trim", "prefix", "suffix", "template", "length", "number",
    ];

    fn from_config(config: &Config) -> Result<Self, String> {
        let op = config
            .get_str("op")
            .ok_or_else(|| format!("'op' is required, one of [{}]", Self::NAMES.join(", ")))?;
        let arg = || config.get_str("value").unwrap_or_default().to_string();
        match op {
            "uppercase" => Ok(TextOp::Uppercase),
            "lowercase" => Ok(TextOp::Lowercase),
            "trim" => Ok(TextOp::Trim),
            "prefix" => Ok(TextOp::Prefix(arg())),
            "suffix" => Ok(TextOp::Suffix(arg())),
            "template" => config
                .get_str("template")
                .map(|t| TextOp::Template(t.to_string()))
                .ok_or_else(|| "'template' op needs a 'template' string".to_string()),
            "length" => Ok(TextOp::Length),
            "number" => Ok(TextOp::Number),
            other => Err(format!(
                "unknown op '{}', expected one of [{}]",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TextOp::Uppercase => "uppercase",
            TextOp::Lowercase => "lowercase",
            TextOp::Trim => "trim",
            TextOp::Prefix(_) => "prefix",
            TextOp::Suffix(_) => "suffix",
            TextOp::Template(_) => "template",
            TextOp::Length => "length",
            TextOp::Number => "number",
        }
    }

    /// Applies the op to text, or to every item of a list. `Null` passes through.
    pub fn apply(&self, value: Value) -> Result<Value, HandlerError> {
        match value {
            Value::List(items) => items
                .into_iter()
                .map(|item| self.apply(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            Value::Null => Ok(Value::Null),
            Value::Text(s) => self.apply_text(s),
            scalar @ (Value::Number(_) | Value::Bool(_)) if !self.needs_text() => {
                self.apply_text(scalar.to_text())
            }
            other => Err(mismatch(self.name(), "text or list of text", other)),
        }
    }

    fn needs_text(&self) -> bool {
        matches!(self, TextOp::Uppercase | TextOp::Lowercase | TextOp::Trim)
    }

    fn apply_text(&self, s: String) -> Result<Value, HandlerError> {
        Ok(match self {
            TextOp::Uppercase => Value::Text(s.to_uppercase()),
            TextOp::Lowercase => Value::Text(s.to_lowercase()),
            TextOp::Trim => Value::Text(s.trim().to_string()),
            TextOp::Prefix(p) => Value::Text(format!("{}{}", p, s)),
            TextOp::Suffix(p) => Value::Text(format!("{}{}", s, p)),
            TextOp::Template(t) => Value::Text(t.replace("{item}", &s)),
            TextOp::Length => Value::Number(s.chars().count() as f64),
            TextOp::Number => {
                let parsed = s.trim().parse::<f64>();
                match parsed {
                    Ok(n) => Value::Number(n),
                    Err(_) => return Err(mismatch("number", "numeric text", Value::Text(s))),
                }
            }
        })
    }
}

/// Master macro to define the fixed text-transform handlers and their registration.
macro_rules! define_text_handlers {
    ( $( ($struct_name:ident, $kind:expr, $op:expr) ),* $(,)? ) => {
        $(
            pub struct $struct_name;
            impl NodeHandler for $struct_name {
                fn arity(&self) -> Arity { Arity::Exactly(1) }
                fn invoke<'a>(&'a self, inbound: Vec<Value>, _config: &'a Config) -> BoxFuture<'a, Result<Value, HandlerError>> {
                    ready($op.apply(single(inbound)))
                }
            }
        )*

        pub(super) fn register_text_handlers(registry: &mut HandlerRegistry) {
            $( registry.register($kind, Arc::new($struct_name)); )*
        }
    };
}

define_text_handlers! {
    (UppercaseHandler, "uppercase", TextOp::Uppercase),
    (LowercaseHandler, "lowercase", TextOp::Lowercase),
    (TrimHandler, "trim", TextOp::Trim),
}

// --- Sources and sinks ---

/// Emits the initial input when one was supplied, otherwise `value`, then
/// `default`, then `Null`.
pub struct ConstantInputHandler;

impl NodeHandler for ConstantInputHandler {
    fn arity(&self) -> Arity {
        Arity::Exactly(0)
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let value = inbound
            .into_iter()
            .next()
            .or_else(|| config.get("value").cloned())
            .or_else(|| config.get("default").cloned())
            .unwrap_or_default();
        ready(Ok(value))
    }
}

/// Gathers what reaches a sink. One inbound value is kept as-is, several
/// become a list. An optional `format` renders the result as text.
pub struct CollectOutputHandler;

const OUTPUT_FORMATS: [&str; 5] = ["raw", "text", "json", "markdown", "html"];

impl NodeHandler for CollectOutputHandler {
    fn arity(&self) -> Arity {
        Arity::Any
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        choice(config, "format", "raw", &OUTPUT_FORMATS).map(|_| ())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let collected = match inbound.len() {
            0 => Value::Null,
            1 => single(inbound),
            _ => Value::List(inbound),
        };
        let result = match choice(config, "format", "raw", &OUTPUT_FORMATS) {
            Ok("text") => Ok(Value::Text(collected.to_text())),
            Ok("json") => serde_json::to_string_pretty(&collected.to_json())
                .map(Value::Text)
                .map_err(|e| HandlerError::Failed(format!("JSON rendering failed: {}", e))),
            Ok("markdown") => Ok(Value::Text(format!("```\n{}\n```", collected.to_text()))),
            Ok("html") => Ok(Value::Text(format!(
                "<pre>{}</pre>",
                collected
                    .to_text()
                    .replace('&', "&amp;")
                    .replace('<', "&lt;")
                    .replace('>', "&gt;")
            ))),
            Ok(_) => Ok(collected),
            Err(e) => Err(HandlerError::InvalidConfig(e)),
        };
        ready(result)
    }
}

// --- Control flow ---

/// Evaluates a predicate against its input and labels the outcome.
///
/// Output: `{ branch: <true_label|false_label>, matched: bool, data: input }`.
pub struct PredicateBranchHandler;

impl NodeHandler for PredicateBranchHandler {
    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        Predicate::from_config(config).map(|_| ())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let predicate = match Predicate::from_config(config) {
            Ok(p) => p,
            Err(e) => return ready(Err(HandlerError::InvalidConfig(e))),
        };
        let data = single(inbound);
        let matched = predicate.matches(&data);
        let label = if matched {
            config.get_str("true_label").unwrap_or("true")
        } else {
            config.get_str("false_label").unwrap_or("false")
        };

        let mut output = BTreeMap::new();
        output.insert("branch".to_string(), Value::text(label));
        output.insert("matched".to_string(), Value::Bool(matched));
        output.insert("data".to_string(), data);
        ready(Ok(Value::Map(output)))
    }
}

/// Combines all inbound values with a `strategy`:
/// `concat` (joined with `separator`), `list` (or `array`), or `object` (`input_<i>` keys).
pub struct MergeHandler;

const MERGE_STRATEGIES: [&str; 4] = ["concat", "list", "array", "object"];

impl NodeHandler for MergeHandler {
    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        choice(config, "strategy", "concat", &MERGE_STRATEGIES).map(|_| ())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let result = match choice(config, "strategy", "concat", &MERGE_STRATEGIES) {
            Ok("list" | "array") => Ok(Value::List(inbound)),
            Ok("object") => Ok(Value::Map(
                inbound
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (format!("input_{}", i), v))
                    .collect(),
            )),
            Ok(_) => {
                let separator = config.get_str("separator").unwrap_or("\n");
                Ok(Value::Text(inbound.iter().map(Value::to_text).join(separator)))
            }
            Err(e) => Err(HandlerError::InvalidConfig(e)),
        };
        ready(result)
    }
}

// --- List operations ---

/// Applies a [`TextOp`] selected by `op` to a scalar or to every list item.
pub struct MapHandler;

impl NodeHandler for MapHandler {
    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        TextOp::from_config(config).map(|_| ())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let result = TextOp::from_config(config)
            .map_err(HandlerError::InvalidConfig)
            .and_then(|op| op.apply(single(inbound)));
        ready(result)
    }
}

/// Reshapes a value by `op`: `text` renders it as text, `json` as pretty JSON.
/// Without `op` the value passes through unchanged.
pub struct TransformHandler;

const TRANSFORM_OPS: [&str; 3] = ["none", "text", "json"];

impl NodeHandler for TransformHandler {
    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        choice(config, "op", "none", &TRANSFORM_OPS).map(|_| ())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let value = single(inbound);
        let result = match choice(config, "op", "none", &TRANSFORM_OPS) {
            Ok("text") => Ok(Value::Text(value.to_text())),
            Ok("json") => Ok(Value::Text(
                serde_json::to_string_pretty(&value.to_json()).unwrap_or_else(|_| value.to_text()),
            )),
            Ok(_) => Ok(value),
            Err(e) => Err(HandlerError::InvalidConfig(e)),
        };
        ready(result)
    }
}

/// Keeps the items matching the configured predicate. Text input is split into lines.
pub struct FilterHandler;

impl NodeHandler for FilterHandler {
    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        Predicate::from_config(config).map(|_| ())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let result = Predicate::from_config(config)
            .map_err(HandlerError::InvalidConfig)
            .map(|predicate| {
                Value::List(
                    single(inbound)
                        .into_items()
                        .into_iter()
                        .filter(|item| predicate.matches(item))
                        .collect(),
                )
            });
        ready(result)
    }
}

/// Stable sort by `by` (`alphabetical`, `numerical`, `length`) in `order` (`asc`, `desc`).
/// Without `by` the items keep their order. Non-numeric and NaN items sort as 0.
pub struct SortHandler;

const SORT_KEYS: [&str; 4] = ["none", "alphabetical", "numerical", "length"];
const SORT_ORDERS: [&str; 2] = ["asc", "desc"];

impl NodeHandler for SortHandler {
    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        choice(config, "by", "none", &SORT_KEYS)?;
        choice(config, "order", "asc", &SORT_ORDERS).map(|_| ())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let (by, order) = match (
            choice(config, "by", "none", &SORT_KEYS),
            choice(config, "order", "asc", &SORT_ORDERS),
        ) {
            (Ok(by), Ok(order)) => (by, order),
            (Err(e), _) | (_, Err(e)) => return ready(Err(HandlerError::InvalidConfig(e))),
        };

        let mut items = single(inbound).into_items();
        if by == "none" {
            return ready(Ok(Value::List(items)));
        }
        let number = |v: &Value| v.to_number().filter(|n| !n.is_nan()).unwrap_or(0.0);
        let compare = |a: &Value, b: &Value| -> Ordering {
            match by {
                "numerical" => number(a).total_cmp(&number(b)),
                "length" => a.to_text().chars().count().cmp(&b.to_text().chars().count()),
                _ => a.to_text().cmp(&b.to_text()),
            }
        };
        if order == "desc" {
            items.sort_by(|a, b| compare(b, a));
        } else {
            items.sort_by(compare);
        }
        ready(Ok(Value::List(items)))
    }
}

/// Reduces the items of every inbound value with `op`: `count`, `sum`,
/// `average`, `min`, `max`, `concat`, or `list`. Non-numeric items count as 0.
pub struct AggregateHandler;

const AGGREGATE_OPS: [&str; 7] = ["count", "sum", "average", "min", "max", "concat", "list"];

impl NodeHandler for AggregateHandler {
    fn arity(&self) -> Arity {
        Arity::AtLeast(1)
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        choice(config, "op", "list", &AGGREGATE_OPS).map(|_| ())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let op = match choice(config, "op", "list", &AGGREGATE_OPS) {
            Ok(op) => op,
            Err(e) => return ready(Err(HandlerError::InvalidConfig(e))),
        };

        let items: Vec<Value> = inbound.into_iter().flat_map(Value::into_items).collect();
        let numbers = || items.iter().map(|v| v.to_number().unwrap_or(0.0));
        let value = match op {
            "count" => Value::Number(items.len() as f64),
            "sum" => Value::Number(numbers().sum()),
            "average" if items.is_empty() => Value::Null,
            "average" => Value::Number(numbers().sum::<f64>() / items.len() as f64),
            "min" => numbers().reduce(f64::min).map(Value::Number).unwrap_or_default(),
            "max" => numbers().reduce(f64::max).map(Value::Number).unwrap_or_default(),
            "concat" => {
                let separator = config.get_str("separator").unwrap_or("\n");
                Value::Text(items.iter().map(Value::to_text).join(separator))
            }
            _ => Value::List(items),
        };
        ready(Ok(value))
    }
}

/// Splits text by `mode`: `delimiter` (trimmed items), `chunk` (`chunk_size`
/// characters), `lines`, or `whitespace`. Without `mode` the whole text is the
/// single item.
pub struct SplitHandler;

const SPLIT_MODES: [&str; 5] = ["whole", "delimiter", "chunk", "lines", "whitespace"];

impl NodeHandler for SplitHandler {
    fn arity(&self) -> Arity {
        Arity::Exactly(1)
    }

    fn validate(&self, config: &Config) -> Result<(), String> {
        let mode = choice(config, "mode", "whole", &SPLIT_MODES)?;
        if mode == "chunk" && config.contains_key("chunk_size") {
            match config.get_usize("chunk_size") {
                Some(n) if n > 0 => {}
                _ => return Err("'chunk_size' must be a positive integer".to_string()),
            }
        }
        Ok(())
    }

    fn invoke<'a>(
        &'a self,
        inbound: Vec<Value>,
        config: &'a Config,
    ) -> BoxFuture<'a, Result<Value, HandlerError>> {
        let mode = match choice(config, "mode", "whole", &SPLIT_MODES) {
            Ok(mode) => mode,
            Err(e) => return ready(Err(HandlerError::InvalidConfig(e))),
        };
        let text = single(inbound).to_text();

        let parts: Vec<String> = match mode {
            "delimiter" => {
                let delimiter = config.get_str("delimiter").unwrap_or(",");
                text.split(delimiter).map(|s| s.trim().to_string()).collect()
            }
            "chunk" => {
                let size = config.get_usize("chunk_size").unwrap_or(100).max(1);
                let chars: Vec<char> = text.chars().collect();
                chars.chunks(size).map(|chunk| chunk.iter().collect()).collect()
            }
            "whitespace" => text.split_whitespace().map(str::to_string).collect(),
            "lines" => text.split('\n').map(str::to_string).collect(),
            _ => vec![text],
        };
        ready(Ok(Value::List(parts.into_iter().map(Value::Text).collect())))
    }
}
