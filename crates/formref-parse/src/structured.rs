//! Decomposition of qualified names and structured references into the
//! fine-grained tokens the resolver walks.

use crate::address::{parse_qualifier, split_qualifier};
use crate::vocabulary::TokenKind;

/// Expand a `NameValue` lexeme into its pieces.
///
/// `[1]Sheet1!Rate` becomes `ExternalReference("1")`,
/// `WorksheetNameContent("Sheet1")`, `NameValue("Rate")`;
/// `Table1[[#Data],[Col]]` becomes `TableName`, brackets, `TablePart`,
/// `Comma` and `TableColumn` tokens. A lexeme with nothing to split comes back
/// as a single `NameValue`.
pub fn split_name_lexeme(text: &str) -> Vec<(String, TokenKind)> {
    let mut out = Vec::new();
    let (qualifier, rest) = split_qualifier(text);

    if let Some(q) = qualifier {
        let q = parse_qualifier(q);
        if let Some(external) = q.external {
            out.push((external, TokenKind::ExternalReference));
        }
        if let Some(sheet) = q.sheet {
            out.push((sheet, TokenKind::WorksheetNameContent));
        }
    }

    match rest.find('[') {
        None => {
            if !rest.is_empty() {
                out.push((rest.to_string(), TokenKind::NameValue));
            }
        }
        Some(idx) => {
            if idx > 0 {
                out.push((rest[..idx].to_string(), TokenKind::TableName));
            }
            split_clause(&rest[idx..], &mut out);
        }
    }
    out
}

/// Walk a `[...]` clause. Text directly inside the innermost brackets is an
/// item; between groups only `,` `:` and whitespace are meaningful.
fn split_clause(clause: &str, out: &mut Vec<(String, TokenKind)>) {
    let mut item = String::new();
    let mut escaped_lead = false;
    let mut in_item = false;
    let mut chars = clause.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                if let Some(next) = chars.next() {
                    if item.trim().is_empty() {
                        escaped_lead = true;
                    }
                    item.push(next);
                }
            }
            '[' => {
                flush_item(&mut item, &mut escaped_lead, out);
                out.push(("[".to_string(), TokenKind::OpeningBracket));
                in_item = true;
            }
            ']' => {
                flush_item(&mut item, &mut escaped_lead, out);
                out.push(("]".to_string(), TokenKind::ClosingBracket));
                in_item = false;
            }
            ',' if !in_item => out.push((",".to_string(), TokenKind::Comma)),
            ':' if !in_item => out.push((":".to_string(), TokenKind::Colon)),
            c if !in_item && c.is_whitespace() => {}
            c => item.push(c),
        }
    }
    flush_item(&mut item, &mut escaped_lead, out);
}

fn flush_item(item: &mut String, escaped_lead: &mut bool, out: &mut Vec<(String, TokenKind)>) {
    let escaped = std::mem::take(escaped_lead);
    let text = std::mem::take(item);
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    if !escaped {
        if let Some(column) = text.strip_prefix('@') {
            out.push(("@".to_string(), TokenKind::TablePart));
            let column = column.trim();
            if !column.is_empty() {
                out.push((column.to_string(), TokenKind::TableColumn));
            }
            return;
        }
        if text.starts_with('#') {
            out.push((text.to_string(), TokenKind::TablePart));
            return;
        }
    }
    out.push((text.to_string(), TokenKind::TableColumn));
}
