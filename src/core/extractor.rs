use serde_json::Value;
use tracing::debug;

const FENCE: &str = "```";

/// Pull the JSON decision out of a raw model completion.
///
/// Never fails. When nothing in the text parses, the trimmed input comes
/// back unchanged and the parse error surfaces in the validator instead.
pub fn extract(text: &str) -> String {
    let trimmed = text.trim();
    let body = strip_fence(trimmed);

    if serde_json::from_str::<Value>(body).is_ok() {
        debug!("extractor: whole text is JSON");
        return body.to_string();
    }

    // Quotes in prose usually pair up; an unpaired one (`5"`) would hide
    // everything after it, so retry with prose quotes ignored.
    let found = last_json_object(body, QuoteScope::Everywhere)
        .or_else(|| last_json_object(body, QuoteScope::InsideSpans));

    match found {
        Some(span) => {
            debug!(len = span.len(), "extractor: using last balanced JSON object");
            span.to_string()
        }
        None => {
            debug!("extractor: no JSON object found, returning text as-is");
            trimmed.to_string()
        }
    }
}

/// Remove one ```json ... ``` fence wrapping the whole text.
fn strip_fence(text: &str) -> &str {
    let mut body = text;
    if let Some(rest) = body.strip_prefix(FENCE) {
        // drop the info string (`json`, `JSON`, ...) up to the first newline
        body = match rest.find('\n') {
            Some(nl) => &rest[nl + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
        body = rest;
    }
    body.trim()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteScope {
    Everywhere,
    InsideSpans,
}

/// Single left-to-right scan that tracks string state and open brackets.
/// Every balanced top-level `{...}` span that parses as a JSON object
/// replaces the previous candidate, so the last one wins.
fn last_json_object(text: &str, quotes: QuoteScope) -> Option<&str> {
    let mut best: Option<&str> = None;
    let mut stack: Vec<u8> = Vec::new();
    let mut span_start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' if quotes == QuoteScope::Everywhere || !stack.is_empty() => in_string = true,
            b'{' | b'[' => {
                if stack.is_empty() {
                    span_start = i;
                }
                stack.push(b);
            }
            b'}' | b']' => {
                let Some(open) = stack.pop() else {
                    continue;
                };
                let expected = if b == b'}' { b'{' } else { b'[' };
                if open != expected {
                    // mismatched close: abandon this span and keep scanning
                    stack.clear();
                    continue;
                }
                if stack.is_empty() {
                    let span = &text[span_start..=i];
                    if is_json_object(span) {
                        best = Some(span);
                    }
                }
            }
            _ => {}
        }
    }

    best
}

fn is_json_object(span: &str) -> bool {
    matches!(serde_json::from_str::<Value>(span), Ok(Value::Object(_)))
}
