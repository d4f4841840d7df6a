use crate::ast::{ClauseList, Connector};

/// Render a clause list. The first clause never carries a connector and
/// connectors are written upper-case.
pub fn render_query(list: &ClauseList) -> String {
    let mut out = String::new();
    for (idx, clause) in list.clauses.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
            out.push_str(clause.connector.unwrap_or(Connector::And).as_str());
            out.push(' ');
        }
        out.push_str(clause.text.trim());
    }
    if let Some(order_by) = &list.order_by {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(order_by);
    }
    out
}

impl std::fmt::Display for ClauseList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&render_query(self))
    }
}
