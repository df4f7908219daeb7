//! Label scanner: finds `name:` declarations in raw export text.
//!
//! Markup is skipped (`Tag` state), so `style="color:red"` never reads as a
//! label. Once a JSON-shaped field opens a bracket, the scanner stays in the
//! `Field` state until the matching closer; labels nested inside that value
//! belong to the value.

use std::collections::HashMap;

/// Known label names, matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    by_lower: HashMap<String, &'static str>,
    bracketed: Vec<&'static str>,
}

impl LabelSet {
    pub fn new(
        names: impl IntoIterator<Item = &'static str>,
        bracketed: impl IntoIterator<Item = &'static str>,
    ) -> Self {
        let bracketed: Vec<&'static str> = bracketed.into_iter().collect();
        let by_lower = names
            .into_iter()
            .chain(bracketed.iter().copied())
            .map(|n| (n.to_ascii_lowercase(), n))
            .collect();
        LabelSet { by_lower, bracketed }
    }

    pub fn canonical(&self, name: &str) -> Option<&'static str> {
        self.by_lower.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn is_bracketed(&self, name: &str) -> bool {
        self.bracketed.contains(&name)
    }
}

/// One `name:` occurrence. `start..value_end` covers label and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: &'static str,
    pub start: usize,
    pub value_start: usize,
    pub value_end: usize,
    pub bracketed: bool,
}

impl Label {
    pub fn value<'t>(&self, text: &'t str) -> &'t str {
        &text[self.value_start..self.value_end]
    }
}

#[derive(Clone, Copy)]
enum State {
    Text,
    Tag,
    /// Inside a bracketed value. `plain_start` is where the value would
    /// start as a plain field, used when the closer never comes.
    Field {
        depth: usize,
        quote: Option<Quote>,
        plain_start: usize,
    },
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
}

/// Scan `text` for known labels, in source order. Each plain value runs up to
/// the next label (or end of text); a bracketed value runs to its closer. A
/// bracket that is never closed is rescanned as a plain value, so the labels
/// after it are still found.
pub fn scan(text: &str, labels: &LabelSet) -> Vec<Label> {
    let bytes = text.as_bytes();
    let mut found: Vec<Label> = Vec::new();
    let mut state = State::Text;
    let mut i = 0;

    loop {
        if i >= bytes.len() {
            let State::Field { plain_start, .. } = state else {
                break;
            };
            if let Some(last) = found.last_mut() {
                last.bracketed = false;
                last.value_start = plain_start;
                last.value_end = bytes.len();
            }
            state = State::Text;
            i = plain_start;
            continue;
        }

        match state {
            State::Tag => {
                if bytes[i] == b'>' {
                    state = State::Text;
                }
                i += 1;
            }
            State::Field {
                depth,
                quote,
                plain_start,
            } => {
                // raw `<` is always markup in an export; attribute quotes are not string quotes
                if bytes[i] == b'<' {
                    i += bytes[i..].iter().position(|c| *c == b'>').unwrap_or(bytes.len() - i - 1) + 1;
                    continue;
                }
                if let Some(open) = quote {
                    match quote_at(bytes, i) {
                        Some((q, len)) if q == open && !(q == Quote::Single && is_apostrophe(bytes, i, len)) => {
                            state = State::Field { depth, quote: None, plain_start };
                            i += len;
                        }
                        _ if bytes[i] == b'\\' => i += 2,
                        _ => i += 1,
                    }
                    continue;
                }
                if let Some((q, len)) = quote_at(bytes, i) {
                    state = State::Field { depth, quote: Some(q), plain_start };
                    i += len;
                    continue;
                }
                match bytes[i] {
                    b'[' | b'{' => state = State::Field { depth: depth + 1, quote: None, plain_start },
                    b']' | b'}' if depth == 1 => {
                        if let Some(last) = found.last_mut() {
                            last.value_end = i + 1;
                        }
                        state = State::Text;
                    }
                    b']' | b'}' => state = State::Field { depth: depth - 1, quote: None, plain_start },
                    _ => {}
                }
                i += 1;
            }
            State::Text => {
                let b = bytes[i];
                if b == b'<' {
                    state = State::Tag;
                    i += 1;
                    continue;
                }
                let at_boundary = i == 0 || !is_ident_byte(bytes[i - 1]);
                if !(b.is_ascii_alphabetic() && at_boundary) {
                    i += 1;
                    continue;
                }

                let ident_end = i + bytes[i..].iter().take_while(|c| is_ident_byte(**c)).count();
                let mut colon = ident_end;
                while colon < bytes.len() && (bytes[colon] == b' ' || bytes[colon] == b'\t') {
                    colon += 1;
                }
                let Some(name) = (colon < bytes.len() && bytes[colon] == b':')
                    .then(|| labels.canonical(&text[i..ident_end]))
                    .flatten()
                else {
                    i = ident_end;
                    continue;
                };

                close_previous(&mut found, i);
                let value_start = colon + 1;
                let opener = labels
                    .is_bracketed(name)
                    .then(|| find_opener(bytes, value_start))
                    .flatten();
                found.push(Label {
                    name,
                    start: i,
                    value_start,
                    value_end: bytes.len(),
                    bracketed: opener.is_some(),
                });
                match (opener, found.last_mut()) {
                    (Some(at), Some(label)) => {
                        label.value_start = at;
                        state = State::Field {
                            depth: 1,
                            quote: None,
                            plain_start: value_start,
                        };
                        i = at + 1;
                    }
                    _ => i = value_start,
                }
            }
        }
    }

    found
}

/// Quote characters as they appear in exports: ASCII, typographic, or as
/// entity references.
fn quote_at(bytes: &[u8], i: usize) -> Option<(Quote, usize)> {
    const FORMS: &[(&str, Quote)] = &[
        ("\"", Quote::Double),
        ("'", Quote::Single),
        ("\u{201c}", Quote::Double),
        ("\u{201d}", Quote::Double),
        ("\u{2018}", Quote::Single),
        ("\u{2019}", Quote::Single),
        ("&quot;", Quote::Double),
        ("&ldquo;", Quote::Double),
        ("&rdquo;", Quote::Double),
        ("&#34;", Quote::Double),
        ("&#39;", Quote::Single),
        ("&apos;", Quote::Single),
        ("&lsquo;", Quote::Single),
        ("&rsquo;", Quote::Single),
    ];
    let rest = &bytes[i..];
    FORMS
        .iter()
        .find(|(form, _)| rest.starts_with(form.as_bytes()))
        .map(|(form, q)| (*q, form.len()))
}

/// `d'água`, `it’s`: a single quote between letters does not close a string.
fn is_apostrophe(bytes: &[u8], i: usize, len: usize) -> bool {
    let before = i.checked_sub(1).map(|p| bytes[p]);
    let after = bytes.get(i + len).copied();
    // non-ASCII bytes are parts of accented letters
    let letter = |b: u8| b.is_ascii_alphanumeric() || b >= 0x80;
    before.is_some_and(letter) && after.is_some_and(|b| b.is_ascii_alphabetic() || b >= 0x80)
}

fn close_previous(found: &mut [Label], at: usize) {
    if let Some(prev) = found.last_mut() {
        if !prev.bracketed {
            prev.value_end = at;
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// First `[` or `{` after `from`, skipping whitespace, tags and `&nbsp;`.
fn find_opener(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'[' | b'{' => return Some(i),
            b'<' => {
                i += bytes[i..].iter().position(|c| *c == b'>')? + 1;
            }
            b'&' if bytes[i..].starts_with(b"&nbsp;") => i += 6,
            c if c.is_ascii_whitespace() => i += 1,
            // U+00A0 as raw UTF-8
            0xC2 if bytes.get(i + 1) == Some(&0xA0) => i += 2,
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> LabelSet {
        LabelSet::new(["type", "text", "title", "subtitle", "color"], ["items", "children"])
    }

    fn names(text: &str) -> Vec<&'static str> {
        scan(text, &set()).iter().map(|l| l.name).collect()
    }

    #[test]
    fn finds_labels_in_order() {
        assert_eq!(names("type: texto\ntext: Hello"), vec!["type", "text"]);
    }

    #[test]
    fn values_stop_at_next_label() {
        let text = "type: texto\ntext: Hello <b>World</b>\ntitle: T";
        let labels = scan(text, &set());
        assert_eq!(labels[0].value(text), " texto\n");
        assert_eq!(labels[1].value(text), " Hello <b>World</b>\n");
        assert_eq!(labels[2].value(text), " T");
    }

    #[test]
    fn case_insensitive_canonical_names() {
        assert_eq!(names("TYPE: x Title: y"), vec!["type", "title"]);
    }

    #[test]
    fn word_boundary_required() {
        // `subtitle:` must not produce a `title` label
        assert_eq!(names("subtitle: a"), vec!["subtitle"]);
        assert_eq!(names("my_text: a"), Vec::<&str>::new());
    }

    #[test]
    fn unknown_names_are_values() {
        let text = "text: see https://x.org and Nota: fim";
        let labels = scan(text, &set());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].value(text), " see https://x.org and Nota: fim");
    }

    #[test]
    fn markup_is_skipped() {
        let text = "<span style=\"color:red\">text: a</span>";
        let labels = scan(text, &set());
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "text");
    }

    #[test]
    fn bracketed_value_hides_nested_labels() {
        let text = "type: section\nchildren: [{type: 'texto', text: 'a [b]'}]\ntitle: x";
        let labels = scan(text, &set());
        assert_eq!(
            labels.iter().map(|l| l.name).collect::<Vec<_>>(),
            vec!["type", "children", "title"]
        );
        assert_eq!(labels[1].value(text), "[{type: 'texto', text: 'a [b]'}]");
    }

    #[test]
    fn bracket_opener_after_markup() {
        let text = "items:</span><span>&nbsp;[1, 2]</span>";
        let labels = scan(text, &set());
        assert!(labels[0].bracketed);
        assert_eq!(labels[0].value(text), "[1, 2]");
    }

    #[test]
    fn unclosed_bracket_rescanned_as_plain_value() {
        let text = "items: [1, 2\ntext: kept\ntype: texto";
        let labels = scan(text, &set());
        assert_eq!(
            labels.iter().map(|l| l.name).collect::<Vec<_>>(),
            vec!["items", "text", "type"]
        );
        assert!(!labels[0].bracketed);
        assert_eq!(labels[0].value(text), " [1, 2\n");
        assert_eq!(labels[1].value(text), " kept\n");
    }

    #[test]
    fn closers_inside_strings_ignored() {
        let text = "items: [{src: 'a.jpg', caption: 'Fase 1] fim'}]\ntext: x";
        let labels = scan(text, &set());
        assert_eq!(labels[0].value(text), "[{src: 'a.jpg', caption: 'Fase 1] fim'}]");
        assert_eq!(labels[1].name, "text");

        let text = "items: [{\u{201c}t\u{201d}: \u{201c}a }\u{201d}}, {t: &#39;b ]&#39;}]";
        assert_eq!(scan(text, &set())[0].value(text), &text[7..]);
    }

    #[test]
    fn apostrophe_does_not_close_string() {
        let text = "items: [{t: 'it's [x] ok'}]text: y";
        let labels = scan(text, &set());
        assert_eq!(labels[0].value(text), "[{t: 'it's [x] ok'}]");
        assert_eq!(labels[1].name, "text");
    }

    #[test]
    fn tag_attributes_inside_value_are_not_quotes() {
        let text = "items: [<span class=\"c1\">1</span>]\ntext: y";
        let labels = scan(text, &set());
        assert_eq!(labels[0].value(text), "[<span class=\"c1\">1</span>]");
        assert_eq!(labels[1].name, "text");
    }

    #[test]
    fn bracketed_name_without_bracket_is_plain() {
        let text = "items: none\ntext: a";
        let labels = scan(text, &set());
        assert!(!labels[0].bracketed);
        assert_eq!(labels[0].value(text), " none\n");
    }

    #[test]
    fn space_before_colon_allowed() {
        assert_eq!(names("type : texto"), vec!["type"]);
    }
}
