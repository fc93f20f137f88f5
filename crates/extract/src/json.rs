//! Recovery of JSON payloads from free-form model output.
//!
//! Models wrap JSON in markdown fences or chatter around it; these helpers
//! cut out the outermost array or object so `serde_json` can take over.

/// Outermost `[...]` block in `text`, if any.
pub fn json_array(text: &str) -> Option<&str> {
    outermost(text, '[', ']')
}

/// Outermost `{...}` block in `text`, if any.
pub fn json_object(text: &str) -> Option<&str> {
    outermost(text, '{', '}')
}

fn outermost(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}
