//! JSON-shaped field values written by hand in a word processor:
//! smart quotes, single quotes, bare keys, trailing commas, stray markup.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::Warning;
use crate::parser::{entities, html, Diagnostics};

static DOUBLE_QUOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{201c}\u{201d}\u{201e}\u{201f}\u{2033}\u{301d}\u{301e}\u{ff02}]").unwrap());
static SINGLE_QUOTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{2018}\u{2019}\u{201a}\u{201b}\u{2032}\u{ff07}\u{b4}`]").unwrap());

const RICH_KEYS: &[&str] = &["text", "caption", "content"];

/// Sanitize and parse a bracketed field value. Unparseable input becomes `[]`
/// and raises a `MalformedJsonField` warning.
pub fn parse_field(field: &str, block_type: &str, raw: &str, diag: &mut Diagnostics) -> Value {
    let cleaned = sanitize(raw);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(mut value) => {
            normalize_strings(&mut value, None);
            value
        }
        Err(e) => {
            debug!(field, cleaned = %cleaned, "json field rejected");
            diag.warn(Warning::MalformedJsonField {
                field: field.to_string(),
                block_type: block_type.to_string(),
                reason: e.to_string(),
            });
            Value::Array(Vec::new())
        }
    }
}

/// Text clean-up, then a rewrite into strict JSON.
pub fn sanitize(raw: &str) -> String {
    // tags, entities, whitespace runs
    let text = html::strip_tags(raw);
    let text = DOUBLE_QUOTES_RE.replace_all(&text, "\"");
    let text = SINGLE_QUOTES_RE.replace_all(&text, "'");
    relax(&text)
}

/// Outside strings: drop whitespace around separators, drop trailing commas,
/// quote bare keys. Single-quoted strings are re-emitted double-quoted.
fn relax(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' => i = copy_double_quoted(&chars, i, &mut out),
            '\'' => i = convert_single_quoted(&chars, i, &mut out),
            ']' | '}' => {
                if out.ends_with(',') {
                    out.pop();
                }
                out.push(c);
                i += 1;
            }
            c if c.is_whitespace() => {
                let next = chars[i..].iter().find(|c| !c.is_whitespace());
                let prev = out.chars().last();
                let around_separator = matches!(prev, None | Some('[' | '{' | ':' | ','))
                    || matches!(next, None | Some(']' | '}' | ':' | ','));
                if !around_separator {
                    out.push(' ');
                }
                i += chars[i..].iter().take_while(|c| c.is_whitespace()).count();
            }
            c if is_key_start(c) && matches!(out.chars().last(), Some('{' | ',')) => {
                let len = chars[i..].iter().take_while(|c| is_key_char(**c)).count();
                let after = chars[i + len..].iter().find(|c| !c.is_whitespace());
                let ident: String = chars[i..i + len].iter().collect();
                if after == Some(&':') {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(&ident);
                }
                i += len;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

fn copy_double_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        match c {
            '\\' if i < chars.len() => {
                out.push(chars[i]);
                i += 1;
            }
            '"' => return i,
            _ => {}
        }
    }
    i
}

fn convert_single_quoted(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push('"');
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' if chars.get(i + 1) == Some(&'\'') => {
                out.push('\'');
                i += 2;
            }
            '\\' => {
                out.push('\\');
                if let Some(next) = chars.get(i + 1) {
                    out.push(*next);
                }
                i += 2;
            }
            '"' => {
                out.push_str("\\\"");
                i += 1;
            }
            '\'' if is_apostrophe(chars, i) => {
                out.push('\'');
                i += 1;
            }
            '\'' => {
                out.push('"');
                return i + 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    i
}

/// `it's`, `d'água`: a quote between two letters is part of the string.
fn is_apostrophe(chars: &[char], i: usize) -> bool {
    let before = i.checked_sub(1).and_then(|p| chars.get(p));
    let after = chars.get(i + 1);
    before.is_some_and(|c| c.is_alphanumeric()) && after.is_some_and(|c| c.is_alphabetic())
}

fn is_key_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$' || c == '-'
}

fn normalize_strings(value: &mut Value, key: Option<&str>) {
    match value {
        Value::String(s) => {
            *s = if key.is_some_and(|k| RICH_KEYS.contains(&k)) {
                html::normalize_rich_text(s)
            } else {
                entities::decode(s)
            };
        }
        Value::Array(items) => items.iter_mut().for_each(|v| normalize_strings(v, None)),
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                normalize_strings(v, Some(k.as_str()));
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: &str) -> (Value, Vec<Warning>) {
        let mut diag = Diagnostics::default();
        let v = parse_field("items", "lista", raw, &mut diag);
        (v, diag.into_warnings())
    }

    #[test]
    fn single_quotes_and_trailing_comma() {
        let (v, warnings) = parse("[{name: 'A',}]");
        assert_eq!(v, json!([{"name": "A"}]));
        assert!(warnings.is_empty());
    }

    #[test]
    fn smart_quotes_spans_and_commas_match_clean_form() {
        let messy = "[<span class=\"c1\">{\u{201c}src\u{201d}: \u{201c}a.jpg\u{201d},</span>\n\
                     <span>\u{201c}caption\u{201d}:&nbsp;\u{2018}Foto 1\u{2019}, },</span>]";
        let clean = r#"[{"src": "a.jpg", "caption": "Foto 1"}]"#;
        let (messy_v, warnings) = parse(messy);
        let (clean_v, _) = parse(clean);
        assert_eq!(messy_v, clean_v);
        assert!(warnings.is_empty());
    }

    #[test]
    fn apostrophes_inside_single_quoted_strings() {
        let (v, _) = parse("[{text: 'It\u{2019}s d\u{2019}\u{e1}gua'}]");
        assert_eq!(v, json!([{"text": "It's d'água"}]));
    }

    #[test]
    fn nested_structures_and_numbers() {
        let (v, _) = parse("[{time: 0, text: 'A'}, {time: 2.5, text: 'B', tags: ['x', 'y',],},]");
        assert_eq!(
            v,
            json!([{"time": 0, "text": "A"}, {"time": 2.5, "text": "B", "tags": ["x", "y"]}])
        );
    }

    #[test]
    fn object_value_allowed() {
        let (v, _) = parse("{mobile: 'm.mp4', desktop: 'd.mp4'}");
        assert_eq!(v, json!({"mobile": "m.mp4", "desktop": "d.mp4"}));
    }

    #[test]
    fn strings_keep_inner_separators() {
        let (v, _) = parse("[{text: 'Hora: 10:30, fim'}]");
        assert_eq!(v, json!([{"text": "Hora: 10:30, fim"}]));
    }

    #[test]
    fn malformed_becomes_empty_array_with_warning() {
        let (v, warnings) = parse("[{name: 'A' oops ]");
        assert_eq!(v, json!([]));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(&warnings[0], Warning::MalformedJsonField { field, .. } if field == "items"));
    }

    #[test]
    fn string_properties_are_decoded() {
        let (v, _) = parse(r#"[{"alt": "Elei&ccedil;&atilde;o", "caption": "a&nbsp;&nbsp;b"}]"#);
        assert_eq!(v, json!([{"alt": "Eleição", "caption": "a b"}]));
    }
}
