use serde::de::DeserializeOwned;

use crate::util::strip_code_blocks;

/// Outcome of parsing generated text as structured data.
///
/// Generation backends return free-form text that callers *attempt* to read
/// as JSON. A failed parse is not an error: the caller pattern-matches and
/// substitutes a stage-specific placeholder built from the raw text.
#[derive(Debug, Clone)]
pub enum Parsed<T> {
    Structured(T),
    Fallback(String),
}

impl<T> Parsed<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, Parsed::Structured(_))
    }
}

/// Parse a generation response as JSON, tolerating markdown code fences.
pub fn parse_json<T: DeserializeOwned>(response: &str) -> Parsed<T> {
    let cleaned = strip_code_blocks(response);
    match serde_json::from_str(cleaned) {
        Ok(value) => Parsed::Structured(value),
        Err(_) => Parsed::Fallback(response.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json() {
        let parsed: Parsed<Vec<u32>> = parse_json("```json\n[1, 2, 3]\n```");
        match parsed {
            Parsed::Structured(v) => assert_eq!(v, vec![1, 2, 3]),
            Parsed::Fallback(_) => panic!("expected structured"),
        }
    }

    #[test]
    fn falls_back_on_prose() {
        let parsed: Parsed<Vec<u32>> = parse_json("Here are some thoughts instead.");
        match parsed {
            Parsed::Structured(_) => panic!("expected fallback"),
            Parsed::Fallback(raw) => assert!(raw.contains("thoughts")),
        }
    }

    #[test]
    fn fallback_preserves_original_text_not_stripped() {
        let parsed: Parsed<u32> = parse_json("```\nnot json\n```");
        match parsed {
            Parsed::Fallback(raw) => assert!(raw.starts_with("```")),
            Parsed::Structured(_) => panic!("expected fallback"),
        }
    }
}
