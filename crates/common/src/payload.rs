//! Hook payload delivered by the host on stdin.
//!
//! The payload is not schema-validated: fields of an unexpected type are read
//! the way a loosely typed host would read them (falsy means absent).

use serde::Deserialize;
use serde_json::Value;

use crate::errors::{BenchlogError, BenchlogResult};
use crate::event::ContextUsage;
use crate::session::SessionId;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookPayload {
    #[serde(default)]
    pub session_id: Option<Value>,
    #[serde(default)]
    pub tool_name: Option<Value>,
    #[serde(default)]
    pub tool_input: Option<Value>,
    #[serde(default)]
    pub context: Option<Value>,
}

impl HookPayload {
    /// Only a JSON object is a payload; arrays and scalars are rejected.
    pub fn parse(input: &str) -> BenchlogResult<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|err| BenchlogError::invalid_payload(err.to_string()))?;
        if !value.is_object() {
            return Err(BenchlogError::invalid_payload(
                "payload is not a JSON object",
            ));
        }
        serde_json::from_value(value).map_err(|err| BenchlogError::invalid_payload(err.to_string()))
    }

    /// Session key, or `fallback` when absent or empty.
    pub fn session_id(&self, fallback: &str) -> SessionId {
        match self.session_id.as_ref() {
            Some(Value::String(id)) if !id.is_empty() => SessionId::new(id.clone()),
            Some(number @ Value::Number(_)) => SessionId::new(js_json(number)),
            _ => SessionId::new(fallback),
        }
    }

    pub fn tool_name(&self) -> Option<String> {
        match self.tool_name.as_ref()? {
            Value::String(name) if !name.is_empty() => Some(name.clone()),
            Value::String(_) => None,
            other if is_truthy(other) => Some(other.to_string()),
            _ => None,
        }
    }

    /// Length of the compact serialization of `tool_input`, counted in
    /// UTF-16 code units. An absent or falsy input counts as `{}`.
    ///
    /// Numbers are written the way a JavaScript host writes them, so `1.0`
    /// counts as `1` and `1e3` as `1000`.
    pub fn tool_input_size(&self) -> usize {
        let serialized = match self.tool_input.as_ref().filter(|v| is_truthy(v)) {
            Some(value) => js_json(value),
            None => "{}".to_string(),
        };
        serialized.encode_utf16().count()
    }

    /// Token counts when a context object was supplied.
    pub fn context_usage(&self) -> Option<ContextUsage> {
        let context = self.context.as_ref().filter(|v| is_truthy(v))?;
        Some(usage_from(context))
    }

    /// Token counts, zero when no context was supplied.
    pub fn context_usage_or_default(&self) -> ContextUsage {
        self.context.as_ref().map(usage_from).unwrap_or_default()
    }
}

fn usage_from(context: &Value) -> ContextUsage {
    ContextUsage::new(count(context.get("input")), count(context.get("output")))
}

/// Non-negative integral numbers are kept, everything else reads as 0.
fn count(value: Option<&Value>) -> u64 {
    let Some(Value::Number(n)) = value else {
        return 0;
    };
    if let Some(v) = n.as_u64() {
        return v;
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => f as u64,
        _ => 0,
    }
}

/// Compact JSON text with JavaScript number formatting.
fn js_json(value: &Value) -> String {
    let mut out = String::new();
    write_js_json(value, &mut out);
    out
}

fn write_js_json(value: &Value, out: &mut String) {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) => out.push_str(&js_number(f)),
            None => out.push_str(&n.to_string()),
        },
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_js_json(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (index, (key, item)) in map.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_js_json(item, out);
            }
            out.push('}');
        }
        leaf => out.push_str(&leaf.to_string()),
    }
}

/// Integral values below 1e21 print without fraction or exponent; other
/// values keep the shortest form with an explicit `+` on positive exponents.
fn js_number(f: f64) -> String {
    if !f.is_finite() {
        return "null".to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e21 {
        // -0 prints as 0
        return format!("{:.0}", if f == 0.0 { 0.0 } else { f });
    }
    let shortest = Value::from(f).to_string();
    match shortest.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') && !exp.starts_with('+') => {
            format!("{mantissa}e+{exp}")
        }
        _ => shortest,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
