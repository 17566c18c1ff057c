//! Utilities for extracting structured data from model responses.
//!
//! Even with a JSON response format requested, replies sometimes arrive
//! wrapped in markdown code fences or mixed with prose. This module provides
//! extraction that handles the common patterns before parsing.

use fabula_error::{FabulaResult, JsonError};

/// Extract JSON from a response that may contain markdown or extra text.
///
/// Tries, in order:
/// 1. Markdown code blocks: ```json ... ```
/// 2. Balanced braces: { ... }
/// 3. Balanced brackets: [ ... ]
///
/// # Errors
///
/// Returns an error if no JSON-looking region is found.
///
/// # Examples
///
/// ```
/// use fabula_book::extract_json;
///
/// let response = "Here is page 1:\n```json\n{\"page_number\": 1}\n```\n";
/// let json = extract_json(response).unwrap();
/// assert!(json.contains("page_number"));
/// ```
pub fn extract_json(response: &str) -> FabulaResult<String> {
    if let Some(json) = extract_from_code_block(response, "json") {
        return Ok(json);
    }

    // Prefer whichever structure opens first.
    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');

    let first_try_array = matches!((bracket_pos, brace_pos), (Some(b), Some(c)) if b < c)
        || matches!((bracket_pos, brace_pos), (Some(_), None));

    if first_try_array {
        if let Some(json) = extract_balanced(response, '[', ']') {
            return Ok(json);
        }
    }
    if let Some(json) = extract_balanced(response, '{', '}') {
        return Ok(json);
    }
    if let Some(json) = extract_balanced(response, '[', ']') {
        return Ok(json);
    }

    tracing::error!(
        response_length = response.len(),
        "No JSON found in model response"
    );

    Err(JsonError::new(format!(
        "No JSON found in response (length: {})",
        response.len()
    ))
    .into())
}

/// Extract content from a markdown code block, with or without a language tag.
fn extract_from_code_block(response: &str, language: &str) -> Option<String> {
    let pattern = format!("```{}", language);

    if let Some(start) = response.find(&pattern) {
        let content_start = start + pattern.len();
        if let Some(end) = response[content_start..].find("```") {
            let content = &response[content_start..content_start + end];
            return Some(content.trim().to_string());
        }
        // No closing fence, likely a truncated response
        return Some(response[content_start..].trim().to_string());
    }

    if let Some(start) = response.find("```") {
        let content_start = start + 3;
        // Skip past any language specifier on the fence line
        let skip_to = response[content_start..]
            .find('\n')
            .map(|n| content_start + n + 1)
            .unwrap_or(content_start);

        if let Some(end) = response[skip_to..].find("```") {
            let content = &response[skip_to..skip_to + end];
            return Some(content.trim().to_string());
        }
        return Some(response[skip_to..].trim().to_string());
    }

    None
}

/// Extract content between balanced delimiters, respecting JSON strings.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse extracted JSON into a concrete type.
///
/// # Errors
///
/// Returns an error if the JSON string cannot be parsed into type `T`.
pub fn parse_json<T>(json_str: &str) -> FabulaResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(json_str).map_err(|e| {
        let preview: String = json_str.chars().take(100).collect();

        tracing::error!(
            error = %e,
            json_preview = %preview,
            "JSON parsing failed"
        );

        JsonError::new(format!("Failed to parse JSON: {} (JSON: {}...)", e, preview)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_from_code_block() {
        let response = "Here's page 1:\n\n```json\n{\n  \"page_number\": 1,\n  \"scene_description\": \"A meadow\"\n}\n```\n\nHope this helps!";
        let json = extract_json(response).unwrap();
        assert!(json.contains("\"page_number\": 1"));
        assert!(!json.contains("```"));
    }

    #[test]
    fn extracts_balanced_braces_from_prose() {
        let response = r#"Sure! {"page_number": 2, "nested": {"value": "test"}}"#;
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
        assert!(json.contains("nested"));
    }

    #[test]
    fn extracts_array_when_it_opens_first() {
        let response = "[\n  {\"id\": 1},\n  {\"id\": 2}\n]";
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('['));
        assert!(json.ends_with(']'));
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() {
        let response = r#"{"text": "She said \"hello {there}\""}"#;
        let json = extract_json(response).unwrap();
        assert!(json.contains("She said"));
    }

    #[test]
    fn plain_text_is_an_error() {
        assert!(extract_json("No structure here at all").is_err());
    }

    #[test]
    fn truncated_code_block_returns_remainder() {
        let response = "```json\n{\"page_number\": 3";
        let json = extract_json(response).unwrap();
        assert!(json.contains("page_number"));
    }

    #[test]
    fn parse_json_into_struct() {
        use serde::Deserialize;

        #[derive(Deserialize, Debug)]
        struct Page {
            page_number: u32,
        }

        let page: Page = parse_json(r#"{"page_number": 7}"#).unwrap();
        assert_eq!(page.page_number, 7);
    }

    #[test]
    fn parse_json_reports_preview_on_failure() {
        let result: FabulaResult<serde_json::Value> = parse_json("{not json");
        let err = result.unwrap_err();
        assert!(format!("{}", err).contains("Failed to parse JSON"));
    }
}
