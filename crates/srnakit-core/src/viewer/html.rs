//! Small HTML and JSON embedding helpers shared by the page builders.

use serde::Serialize;

/// Escapes text for safe interpolation into HTML element content and
/// attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serializes a value for embedding inside a `<script>` block.
///
/// `</` is escaped so embedded structure text cannot terminate the script
/// element early.
pub fn script_safe_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<b>"A&B"</b>"#),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn json_embedding_neutralizes_script_terminators() {
        let value = json!({"text": "data_x\n</script><script>alert(1)"});
        let out = script_safe_json(&value).unwrap();
        assert!(!out.contains("</script"));
        assert!(out.contains("<\\/script"));
    }
}
