//! FILENAME: core/script-host/src/convert.rs
//! PURPOSE: Value conversion between QuickJS and serde_json, plus diagnostic
//! formatting for values thrown or rejected inside a context.

use rquickjs::{Ctx, Exception, Value};

/// Convert a serde_json value into a live value inside the given context.
pub fn json_to_js<'js>(
    ctx: &Ctx<'js>,
    value: &serde_json::Value,
) -> rquickjs::Result<Value<'js>> {
    let text = serde_json::to_string(value)
        .map_err(|e| Exception::throw_message(ctx, &format!("json encode failed: {}", e)))?;
    ctx.json_parse(text)
}

/// Convert a live value into serde_json. `undefined` and values that cannot
/// be stringified (functions, cycles) come back as `Null`.
pub fn js_to_json<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> serde_json::Value {
    if value.is_undefined() {
        return serde_json::Value::Null;
    }
    let text = match ctx.json_stringify(value.clone()) {
        Ok(Some(s)) => match s.to_string() {
            Ok(text) => text,
            Err(_) => return serde_json::Value::Null,
        },
        _ => return serde_json::Value::Null,
    };
    serde_json::from_str(&text).unwrap_or(serde_json::Value::Null)
}

/// Render a thrown or rejected value as a diagnostic string.
///
/// Error objects contribute their message and stack; anything else falls
/// back to its JSON rendering so primitives rejected by scripts stay
/// readable in the log.
pub fn error_detail<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> String {
    if let Some(obj) = value.as_object() {
        let message: Option<String> = obj.get("message").ok().filter(|m: &String| !m.is_empty());
        if let Some(message) = message {
            let stack: Option<String> = obj.get("stack").ok();
            return match stack {
                Some(stack) if !stack.is_empty() => format!("{}\n{}", message, stack),
                _ => message,
            };
        }
    }
    if let Some(s) = value.as_string() {
        if let Ok(text) = s.to_string() {
            return text;
        }
    }
    match js_to_json(ctx, value) {
        serde_json::Value::Null => "unknown error".to_string(),
        other => other.to_string(),
    }
}

/// Render a value for the console sink. Strings print bare; everything else
/// prints its JSON rendering.
pub fn display_value<'js>(ctx: &Ctx<'js>, value: &Value<'js>) -> String {
    if let Some(s) = value.as_string() {
        if let Ok(text) = s.to_string() {
            return text;
        }
    }
    if value.is_undefined() {
        return "undefined".to_string();
    }
    match js_to_json(ctx, value) {
        serde_json::Value::Null if !value.is_null() => "[unprintable]".to_string(),
        other => other.to_string(),
    }
}

/// JavaScript truthiness over the JSON image of a value.
pub fn json_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}
