use crate::ast::{Clause, ClauseList, Connector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Connector(Connector),
    OrderBy,
}

/// Split a query into top-level clauses.
///
/// Connectors inside quotes or parentheses are left alone. Empty segments
/// (`a AND AND b`, leading or trailing connectors) are dropped and the last
/// connector seen before a clause is the one it keeps.
pub fn parse_query(query: &str) -> ClauseList {
    let markers = scan(query);
    let (body_end, order_by) = match markers.iter().find(|(_, _, m)| *m == Marker::OrderBy) {
        Some((pos, _, _)) => {
            let tail = query[*pos..].trim();
            (*pos, (!tail.is_empty()).then(|| tail.to_string()))
        }
        None => (query.len(), None),
    };

    let mut clauses = Vec::new();
    let mut pending: Option<Connector> = None;
    let mut start = 0;
    for (pos, len, marker) in markers {
        let Marker::Connector(conn) = marker else {
            continue;
        };
        if pos >= body_end {
            break;
        }
        push_segment(&mut clauses, &query[start..pos], pending);
        pending = Some(conn);
        start = pos + len;
    }
    if start < body_end {
        push_segment(&mut clauses, &query[start..body_end], pending);
    }

    ClauseList { clauses, order_by }
}

/// Body of a clause wrapped in one matching pair of parentheses,
/// `(a OR b)` → `a OR b`. `None` for `(a) OR (b)` and unwrapped clauses.
pub fn group_body(text: &str) -> Option<&str> {
    let text = text.trim();
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'(') || bytes.last() != Some(&b')') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (i == bytes.len() - 1).then(|| &text[1..i]);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn push_segment(clauses: &mut Vec<Clause>, segment: &str, connector: Option<Connector>) {
    let text = segment.trim();
    if text.is_empty() {
        return;
    }
    clauses.push(Clause::new(connector, text));
}

/// Byte offsets of top-level connectors and of an `ORDER BY` tail.
/// Keywords are ASCII, so every offset is a char boundary.
fn scan(query: &str) -> Vec<(usize, usize, Marker)> {
    let bytes = query.as_bytes();
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            _ if depth == 0 && boundary_before(bytes, i) => {
                if let Some((len, marker)) = keyword_at(bytes, i) {
                    out.push((i, len, marker));
                    if marker == Marker::OrderBy {
                        break;
                    }
                    i += len;
                    continue;
                }
            }
            _ => {}
        }
        i += 1;
    }
    out
}

fn boundary_before(bytes: &[u8], i: usize) -> bool {
    i == 0 || bytes[i - 1].is_ascii_whitespace() || bytes[i - 1] == b')'
}

fn boundary_after(bytes: &[u8], i: usize) -> bool {
    i >= bytes.len() || bytes[i].is_ascii_whitespace() || bytes[i] == b'('
}

fn word_at(bytes: &[u8], i: usize, word: &[u8]) -> bool {
    bytes.len() >= i + word.len() && bytes[i..i + word.len()].eq_ignore_ascii_case(word)
}

fn keyword_at(bytes: &[u8], i: usize) -> Option<(usize, Marker)> {
    if word_at(bytes, i, b"and") && boundary_after(bytes, i + 3) {
        return Some((3, Marker::Connector(Connector::And)));
    }
    if word_at(bytes, i, b"or") && boundary_after(bytes, i + 2) {
        return Some((2, Marker::Connector(Connector::Or)));
    }
    if word_at(bytes, i, b"order") {
        let mut j = i + 5;
        let gap = j;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j > gap && word_at(bytes, j, b"by") && boundary_after(bytes, j + 2) {
            return Some((j + 2 - i, Marker::OrderBy));
        }
    }
    None
}
