// src/pac/strings.rs
//! Conversions between host strings and engine strings.

use boa_engine::{Context, JsString, JsValue};

pub fn to_js(text: &str) -> JsString {
    JsString::from(text)
}

pub fn to_js_value(text: &str) -> JsValue {
    JsValue::from(to_js(text))
}

/// UTF-8 copy of an engine string. Unpaired surrogates come out escaped.
pub fn to_utf8(text: &JsString) -> String {
    text.to_std_string_escaped()
}

/// True if every UTF-16 code unit is at most 0x7F.
pub fn is_ascii(text: &JsString) -> bool {
    // An unpaired surrogate fails decoding, and it is non-ASCII anyway.
    text.to_std_string().map(|s| s.is_ascii()).unwrap_or(false)
}

/// The string as ASCII, or `None` if it holds anything else.
pub fn ascii_from_js(text: &JsString) -> Option<String> {
    is_ascii(text).then(|| to_utf8(text))
}

/// Runs the script-level `toString` conversion. `None` if it threw.
pub fn stringify(value: &JsValue, context: &mut Context) -> Option<String> {
    value.to_string(context).ok().map(|s| to_utf8(&s))
}

/// `args[index]` if present and a string primitive.
pub fn string_arg(args: &[JsValue], index: usize) -> Option<&JsString> {
    args.get(index).and_then(JsValue::as_string)
}
