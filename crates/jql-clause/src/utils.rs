//! Text-level helpers shared by the synthesizer and the rewriter.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DUPLICATE_CONNECTORS: Regex = Regex::new(r"(?i)\b(and|or)\s+(and|or)\b").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Escape backslashes and double quotes for use inside a quoted literal.
pub fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `"a","b"` from `[a, b]`. Blank items are skipped.
pub fn quote_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(|s| format!("\"{}\"", escape_quotes(s)))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn trim_leading_logical(s: &str) -> &str {
    let mut s = s.trim();
    loop {
        if let Some(rest) = strip_word_prefix(s, "and").or_else(|| strip_word_prefix(s, "or")) {
            s = rest.trim_start();
        } else {
            return s;
        }
    }
}

pub fn trim_trailing_logical(s: &str) -> &str {
    let mut s = s.trim();
    loop {
        if let Some(rest) = strip_word_suffix(s, "and").or_else(|| strip_word_suffix(s, "or")) {
            s = rest.trim_end();
        } else {
            return s;
        }
    }
}

/// Strip leading and trailing connectors and surrounding whitespace.
pub fn normalize_clause(s: &str) -> String {
    trim_trailing_logical(trim_leading_logical(s)).to_string()
}

/// Final tidy-up before a query leaves the pipeline: repeated connectors
/// collapse to the last one, whitespace runs collapse to one space, dangling
/// connectors go. Quoted literals are copied as they are. Idempotent.
pub fn clean_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    for (quoted, span) in quoted_spans(query.trim()) {
        if quoted {
            out.push_str(span);
        } else {
            out.push_str(&tidy_unquoted(span));
        }
    }
    normalize_clause(&out)
}

fn tidy_unquoted(span: &str) -> String {
    let mut out = span.to_string();
    while DUPLICATE_CONNECTORS.is_match(&out) {
        out = DUPLICATE_CONNECTORS.replace_all(&out, "$2").into_owned();
    }
    MULTI_SPACE.replace_all(&out, " ").into_owned()
}

/// Split `s` into alternating unquoted and quoted spans, quotes included in
/// the quoted ones. An unterminated quote runs to the end.
fn quoted_spans(s: &str) -> Vec<(bool, &str)> {
    let bytes = s.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let q = bytes[i];
        if q != b'"' && q != b'\'' {
            i += 1;
            continue;
        }
        if start < i {
            spans.push((false, &s[start..i]));
        }
        let open = i;
        i += 1;
        while i < bytes.len() && bytes[i] != q {
            i += if bytes[i] == b'\\' { 2 } else { 1 };
        }
        let close = (i + 1).min(bytes.len());
        spans.push((true, &s[open..close]));
        start = close;
        i = close;
    }
    if start < bytes.len() {
        spans.push((false, &s[start..]));
    }
    spans
}

fn strip_word_prefix<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    let head = s.get(..word.len())?;
    if !head.eq_ignore_ascii_case(word) {
        return None;
    }
    let rest = &s[word.len()..];
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        _ => None,
    }
}

fn strip_word_suffix<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    let cut = s.len().checked_sub(word.len())?;
    let tail = s.get(cut..)?;
    if !tail.eq_ignore_ascii_case(word) {
        return None;
    }
    let rest = &s[..cut];
    match rest.chars().next_back() {
        None => Some(rest),
        Some(c) if c.is_whitespace() => Some(rest),
        _ => None,
    }
}
