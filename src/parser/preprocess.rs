use std::sync::LazyLock;

use regex::Regex;

static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());
static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
static HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b[^>]*>.*?</head\s*>").unwrap());
static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

/// Drop `<style>`, `<script>`, `<head>` regions and HTML comments, content included.
pub fn strip_non_content(raw: &str) -> String {
    let out = COMMENT_RE.replace_all(raw, "");
    let out = STYLE_RE.replace_all(&out, "");
    let out = SCRIPT_RE.replace_all(&out, "");
    HEAD_RE.replace_all(&out, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_regions_case_insensitive() {
        let html = "<HTML><HEAD><title>x</title></HEAD><body><STYLE type=\"text/css\">p{}</STYLE>\
                    <p>keep</p><script>var a = 'type: x';</Script></body></HTML>";
        let out = strip_non_content(html);
        assert_eq!(out, "<HTML><body><p>keep</p></body></HTML>");
    }

    #[test]
    fn head_may_contain_style() {
        let html = "<head><style>.c1{}</style><meta charset=\"utf-8\"></head><body>ok</body>";
        assert_eq!(strip_non_content(html), "<body>ok</body>");
    }

    #[test]
    fn header_tag_is_not_head() {
        let html = "<header>kept</header>";
        assert_eq!(strip_non_content(html), html);
    }

    #[test]
    fn comments_removed() {
        assert_eq!(strip_non_content("a<!-- type: hidden -->b"), "ab");
    }

    #[test]
    fn idempotent() {
        let html = "<head>h</head><body><style>s</style>text</body>";
        let once = strip_non_content(html);
        assert_eq!(strip_non_content(&once), once);
    }

    #[test]
    fn no_regions_is_noop() {
        assert_eq!(strip_non_content("plain <b>text</b>"), "plain <b>text</b>");
    }
}
