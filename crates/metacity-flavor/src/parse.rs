//! LLM response parsing into the flavor contracts.
//!
//! Models often wrap their JSON in a Markdown code block, surround it with
//! prose, or leave a trailing comma. [`parse_json`] tries, in order:
//!
//! 1. the trimmed text as-is,
//! 2. the body of the first code block,
//! 3. the outermost `{ ... }` span,
//!
//! each first verbatim and then with trailing commas removed.

use metacity_types::{BuildingDescription, NewsHeadline, TutorialHint};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::FlavorError;

#[derive(Debug, Deserialize)]
struct RawDescription {
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawHeadline {
    headline: String,
}

#[derive(Debug, Deserialize)]
struct RawHint {
    step: String,
    reasoning: String,
}

/// Parse a building description response.
///
/// # Errors
///
/// Returns [`FlavorError::Parse`] if no recovery strategy yields a
/// non-empty `description`.
pub fn parse_description(raw: &str) -> Result<BuildingDescription, FlavorError> {
    let parsed: RawDescription = parse_json(raw)?;
    Ok(BuildingDescription {
        text: non_empty(parsed.description, "description")?,
    })
}

/// Parse a news headline response.
///
/// # Errors
///
/// Returns [`FlavorError::Parse`] if no recovery strategy yields a
/// non-empty `headline`.
pub fn parse_headline(raw: &str) -> Result<NewsHeadline, FlavorError> {
    let parsed: RawHeadline = parse_json(raw)?;
    Ok(NewsHeadline {
        headline: non_empty(parsed.headline, "headline")?,
    })
}

/// Parse a tutorial hint response.
///
/// # Errors
///
/// Returns [`FlavorError::Parse`] if no recovery strategy yields a
/// non-empty `step`.
pub fn parse_hint(raw: &str) -> Result<TutorialHint, FlavorError> {
    let parsed: RawHint = parse_json(raw)?;
    Ok(TutorialHint {
        step_text: non_empty(parsed.step, "step")?,
        rationale: parsed.reasoning.trim().to_owned(),
    })
}

fn non_empty(value: String, field: &str) -> Result<String, FlavorError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FlavorError::Parse(format!("empty {field}")));
    }
    Ok(trimmed.to_owned())
}

/// Deserialize `raw` as `T`, recovering from common LLM formatting slips.
///
/// # Errors
///
/// Returns [`FlavorError::Parse`] if every strategy fails.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, FlavorError> {
    let trimmed = raw.trim();
    let candidates = [
        Some(trimmed),
        extract_json_from_codeblock(trimmed),
        outermost_object(trimmed),
    ];

    for candidate in candidates.into_iter().flatten() {
        if let Ok(parsed) = serde_json::from_str::<T>(candidate) {
            return Ok(parsed);
        }
        if let Ok(parsed) = serde_json::from_str::<T>(&strip_trailing_commas(candidate)) {
            return Ok(parsed);
        }
    }

    Err(FlavorError::Parse(format!(
        "all parse strategies failed for: {trimmed}"
    )))
}

/// The body of the first fenced code block, with any language tag dropped.
fn extract_json_from_codeblock(text: &str) -> Option<&str> {
    let (_, after_fence) = text.split_once("```")?;
    let body = match after_fence.split_once('\n') {
        Some((tag, rest)) if !tag.trim_start().starts_with('{') => rest,
        _ => after_fence,
    };
    let (inner, _) = body.split_once("```")?;
    Some(inner.trim())
}

/// The span from the first `{` to the last `}`.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Drop commas that sit directly (ignoring whitespace) before `}` or `]`.
fn strip_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ',' {
            let rest = chars.clone().find(|n| !n.is_whitespace());
            if matches!(rest, Some('}' | ']')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_parses() {
        let hint = parse_hint(r#"{"step": "Build a park", "reasoning": "Morale is low"}"#);
        let hint = hint.ok();
        assert_eq!(
            hint.as_ref().map(|h| h.step_text.as_str()),
            Some("Build a park")
        );
        assert_eq!(
            hint.as_ref().map(|h| h.rationale.as_str()),
            Some("Morale is low")
        );
    }

    #[test]
    fn code_block_with_language_tag() {
        let raw = "Here you go:\n```json\n{\"headline\": \"Gold rush hits downtown\"}\n```";
        assert_eq!(
            parse_headline(raw).ok().map(|h| h.headline),
            Some("Gold rush hits downtown".to_owned())
        );
    }

    #[test]
    fn prose_around_object_and_trailing_comma() {
        let raw = "Sure! {\"description\": \"A humble shop.\",} Hope that helps.";
        assert_eq!(
            parse_description(raw).ok().map(|d| d.text),
            Some("A humble shop.".to_owned())
        );
    }

    #[test]
    fn empty_field_is_rejected() {
        assert!(parse_headline(r#"{"headline": "   "}"#).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            parse_description("no json here"),
            Err(FlavorError::Parse(_))
        ));
    }

    #[test]
    fn strip_trailing_commas_keeps_inner_commas() {
        assert_eq!(
            strip_trailing_commas(r#"{"a": [1, 2,], "b": 3,}"#),
            r#"{"a": [1, 2], "b": 3}"#
        );
    }
}
