//! Turn a token stream back into formula text.

use crate::address::is_valid_cell_address;
use crate::tokenizer::Token;
use crate::vocabulary::TokenKind;

/// Canonical formula text for `tokens`: no leading `=`, string literals
/// re-escaped and qualifiers re-quoted where a sheet name needs it.
///
/// Whitespace is dropped except for a single space between two adjacent
/// operands (`A1 B1`), which would otherwise read back as one lexeme.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.len() * 4);
    let mut iter = tokens.iter().peekable();
    let mut previous: Option<TokenKind> = None;

    while let Some(token) = iter.next() {
        if token.kind != TokenKind::WhiteSpace
            && previous.is_some_and(ends_operand)
            && starts_operand(token.kind)
        {
            out.push(' ');
        }
        match token.kind {
            TokenKind::StringContent => out.push_str(&token.value.replace('"', "\"\"")),
            TokenKind::ExternalReference => {
                let link = format!("[{}]", token.value);
                match iter.next_if(|t| t.kind == TokenKind::WorksheetNameContent) {
                    Some(sheet) if sheet_needs_quotes(&sheet.value) => {
                        push_quoted(&mut out, &format!("{link}{}", sheet.value));
                    }
                    Some(sheet) => {
                        out.push_str(&link);
                        out.push_str(&sheet.value);
                    }
                    None => out.push_str(&link),
                }
                out.push('!');
            }
            TokenKind::WorksheetNameContent => {
                if sheet_needs_quotes(&token.value) {
                    push_quoted(&mut out, &token.value);
                } else {
                    out.push_str(&token.value);
                }
                out.push('!');
            }
            TokenKind::TableColumn => {
                for c in token.value.chars() {
                    if matches!(c, '[' | ']' | '#' | '\'') {
                        out.push('\'');
                    }
                    out.push(c);
                }
            }
            TokenKind::WhiteSpace => continue,
            _ => out.push_str(&token.value),
        }
        previous = Some(token.kind);
    }
    out
}

fn ends_operand(kind: TokenKind) -> bool {
    kind.is_error()
        || matches!(
            kind,
            TokenKind::ExcelAddress
                | TokenKind::NameValue
                | TokenKind::Integer
                | TokenKind::Decimal
                | TokenKind::Boolean
                | TokenKind::ClosingParenthesis
                | TokenKind::ClosingBracket
        )
}

fn starts_operand(kind: TokenKind) -> bool {
    kind.is_error()
        || matches!(
            kind,
            TokenKind::ExcelAddress
                | TokenKind::NameValue
                | TokenKind::Integer
                | TokenKind::Decimal
                | TokenKind::Boolean
                | TokenKind::Function
                | TokenKind::TableName
                | TokenKind::ExternalReference
                | TokenKind::WorksheetNameContent
        )
}

fn push_quoted(out: &mut String, text: &str) {
    out.push('\'');
    out.push_str(&text.replace('\'', "''"));
    out.push('\'');
}

/// Whether a sheet name must be wrapped in `'...'` to be read back.
pub fn sheet_needs_quotes(name: &str) -> bool {
    name.is_empty()
        || name.starts_with(|c: char| c.is_ascii_digit())
        || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        || is_valid_cell_address(name)
        || name.eq_ignore_ascii_case("true")
        || name.eq_ignore_ascii_case("false")
}
