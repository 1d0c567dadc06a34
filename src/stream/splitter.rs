//! Brace-aware splitting of a single stream line into JSON object fragments.
//!
//! The engine occasionally writes several objects on one line with no
//! separator (`{...}{...}`), so a line cannot be handed to the JSON parser
//! as-is.

/// Split a line into ordered fragments, one per top-level `{...}` object.
///
/// Braces inside string literals are ignored and a backslash escapes the
/// next character inside a string, so `"a\"}"` never closes an object.
/// An object still open at the end of the line is returned as a trailing
/// fragment so the caller can report it. Non-whitespace text found between
/// objects is also returned as its own fragment; whitespace is dropped.
pub fn split_objects(line: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut start: Option<usize> = None;
    let mut stray: Option<usize> = None;

    for (idx, ch) in line.char_indices() {
        if depth > 0 {
            if in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    in_string = false;
                }
                continue;
            }

            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(begin) = start.take() {
                            fragments.push(&line[begin..idx + 1]);
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        if ch == '{' {
            if let Some(begin) = stray.take() {
                push_trimmed(&mut fragments, &line[begin..idx]);
            }
            depth = 1;
            start = Some(idx);
        } else if stray.is_none() && !ch.is_whitespace() {
            stray = Some(idx);
        }
    }

    if let Some(begin) = start {
        fragments.push(line[begin..].trim_end());
    } else if let Some(begin) = stray {
        push_trimmed(&mut fragments, &line[begin..]);
    }

    fragments
}

fn push_trimmed<'a>(fragments: &mut Vec<&'a str>, text: &'a str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        fragments.push(trimmed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_object() {
        assert_eq!(split_objects(r#"{"status":"Pulling"}"#), vec![r#"{"status":"Pulling"}"#]);
    }

    #[test]
    fn test_concatenated_objects() {
        assert_eq!(
            split_objects(r#"{"a":1}{"b":2}"#),
            vec![r#"{"a":1}"#, r#"{"b":2}"#]
        );
    }

    #[test]
    fn test_brace_inside_string() {
        assert_eq!(split_objects(r#"{"status":"a}b"}"#), vec![r#"{"status":"a}b"}"#]);
        assert_eq!(split_objects(r#"{"status":"{{"}"#), vec![r#"{"status":"{{"}"#]);
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let line = r#"{"stream":"say \"}\" now"}{"b":2}"#;
        assert_eq!(
            split_objects(line),
            vec![r#"{"stream":"say \"}\" now"}"#, r#"{"b":2}"#]
        );
    }

    #[test]
    fn test_escaped_backslash_before_quote() {
        // `\\` is a complete escape, so the following quote closes the string
        let line = r#"{"path":"C:\\"}{"b":2}"#;
        assert_eq!(split_objects(line), vec![r#"{"path":"C:\\"}"#, r#"{"b":2}"#]);
    }

    #[test]
    fn test_nested_objects() {
        let line = r#"{"progressDetail":{"current":1,"total":2},"id":"x"}"#;
        assert_eq!(split_objects(line), vec![line]);
    }

    #[test]
    fn test_whitespace_between_objects_is_dropped() {
        assert_eq!(
            split_objects("  {\"a\":1}  \r {\"b\":2}\r"),
            vec![r#"{"a":1}"#, r#"{"b":2}"#]
        );
    }

    #[test]
    fn test_empty_and_blank_lines() {
        assert!(split_objects("").is_empty());
        assert!(split_objects("   \r").is_empty());
    }

    #[test]
    fn test_unterminated_object_is_returned() {
        assert_eq!(
            split_objects(r#"{"a":1}{"b":"#),
            vec![r#"{"a":1}"#, r#"{"b":"#]
        );
    }

    #[test]
    fn test_stray_text_is_returned() {
        assert_eq!(
            split_objects(r#"garbage {"a":1} tail"#),
            vec!["garbage", r#"{"a":1}"#, "tail"]
        );
    }

    #[test]
    fn test_multibyte_text_inside_string() {
        let line = r#"{"stream":"héllo → wörld"}{"b":"ü"}"#;
        assert_eq!(
            split_objects(line),
            vec![r#"{"stream":"héllo → wörld"}"#, r#"{"b":"ü"}"#]
        );
    }
}
