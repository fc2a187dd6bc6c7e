//! Token kinds and the immutable punctuation / keyword tables the tokenizer
//! consults. The tables are `const`, so every tokenizer shares them.

use std::fmt::{self, Display};

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Operator,
    OpeningParenthesis,
    ClosingParenthesis,
    /// `{` opening an array constant.
    OpeningEnumerable,
    ClosingEnumerable,
    /// A `"` delimiting a string literal.
    String,
    StringContent,
    Comma,
    SemiColon,
    Percent,
    /// Reserved for range intersection; never emitted today.
    WhiteSpace,
    Colon,
    Negator,
    ExcelAddress,
    OpeningBracket,
    ClosingBracket,
    NameValue,
    TableName,
    TableColumn,
    /// `#All`, `#Headers`, `#Data`, `#Totals`, `#This Row` or `@`.
    TablePart,
    WorksheetNameContent,
    ExternalReference,
    Function,
    Integer,
    Decimal,
    Boolean,
    /// `#REF!`
    InvalidReference,
    /// `#NUM!`
    NumericError,
    /// `#VALUE!`
    ValueDataTypeError,
    /// `#NULL!`
    Null,
    /// Any other error literal (`#DIV/0!`, `#N/A`, `#NAME?`, …).
    ErrorValue,
}

impl TokenKind {
    /// True when a `-` or `+` following a token of this kind is unary.
    #[inline]
    pub fn allows_unary_after(self) -> bool {
        matches!(
            self,
            TokenKind::Operator
                | TokenKind::Negator
                | TokenKind::OpeningParenthesis
                | TokenKind::Comma
                | TokenKind::SemiColon
                | TokenKind::OpeningEnumerable
        )
    }

    /// True for the error-literal kinds.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            TokenKind::InvalidReference
                | TokenKind::NumericError
                | TokenKind::ValueDataTypeError
                | TokenKind::Null
                | TokenKind::ErrorValue
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

const fn punctuation_kind(b: u8) -> Option<TokenKind> {
    match b {
        b'+' | b'-' | b'*' | b'/' | b'^' | b'&' | b'>' | b'<' | b'=' => Some(TokenKind::Operator),
        b'(' => Some(TokenKind::OpeningParenthesis),
        b')' => Some(TokenKind::ClosingParenthesis),
        b'{' => Some(TokenKind::OpeningEnumerable),
        b'}' => Some(TokenKind::ClosingEnumerable),
        b'"' => Some(TokenKind::String),
        b',' => Some(TokenKind::Comma),
        b';' => Some(TokenKind::SemiColon),
        b'%' => Some(TokenKind::Percent),
        b' ' | b'\t' | b'\r' | b'\n' => Some(TokenKind::WhiteSpace),
        _ => None,
    }
}

const fn build_punctuation() -> [Option<TokenKind>; 128] {
    let mut tbl = [None; 128];
    let mut i = 0;
    while i < 128 {
        tbl[i] = punctuation_kind(i as u8);
        i += 1;
    }
    tbl
}
static PUNCTUATION_TABLE: [Option<TokenKind>; 128] = build_punctuation();

/// Kind of a single-character punctuation token, or `None` if `c` accumulates
/// into a lexeme.
#[inline(always)]
pub fn punctuation(c: char) -> Option<TokenKind> {
    if c.is_ascii() {
        PUNCTUATION_TABLE[c as usize]
    } else {
        None
    }
}

/// Two-character operators, recognised ahead of their one-character prefixes.
pub static TWO_CHAR_OPERATORS: &[&str] = &[">=", "<=", "<>"];

#[inline]
pub fn two_char_operator(first: char, second: char) -> Option<&'static str> {
    TWO_CHAR_OPERATORS.iter().copied().find(|op| {
        let mut chars = op.chars();
        chars.next() == Some(first) && chars.next() == Some(second)
    })
}

const ADDRESS_QUALIFIERS: &str = "!$:[]'";

const fn build_address_qualifiers() -> [bool; 128] {
    let mut tbl = [false; 128];
    let bytes = ADDRESS_QUALIFIERS.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        tbl[bytes[i] as usize] = true;
        i += 1;
    }
    tbl
}
static ADDRESS_QUALIFIER_TABLE: [bool; 128] = build_address_qualifiers();

/// Characters that mark a lexeme as an address or qualified reference.
#[inline(always)]
pub fn is_address_qualifier(c: char) -> bool {
    c.is_ascii() && ADDRESS_QUALIFIER_TABLE[c as usize]
}

/// Special items of a structured reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableItem {
    All,
    Headers,
    Data,
    Totals,
    ThisRow,
}

impl TableItem {
    /// Look up a `TablePart` token value, case-insensitively.
    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "#all" => Some(TableItem::All),
            "#headers" => Some(TableItem::Headers),
            "#data" => Some(TableItem::Data),
            "#totals" => Some(TableItem::Totals),
            "#this row" | "@" => Some(TableItem::ThisRow),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_table() {
        assert_eq!(punctuation('+'), Some(TokenKind::Operator));
        assert_eq!(punctuation('{'), Some(TokenKind::OpeningEnumerable));
        assert_eq!(punctuation('%'), Some(TokenKind::Percent));
        assert_eq!(punctuation(' '), Some(TokenKind::WhiteSpace));
        assert_eq!(punctuation('A'), None);
        assert_eq!(punctuation('!'), None);
        assert_eq!(punctuation('é'), None);
    }

    #[test]
    fn two_char_lookup() {
        assert_eq!(two_char_operator('<', '>'), Some("<>"));
        assert_eq!(two_char_operator('>', '='), Some(">="));
        assert_eq!(two_char_operator('=', '<'), None);
    }

    #[test]
    fn table_items_are_case_insensitive() {
        assert_eq!(TableItem::from_text("#This Row"), Some(TableItem::ThisRow));
        assert_eq!(TableItem::from_text("#DATA"), Some(TableItem::Data));
        assert_eq!(TableItem::from_text("@"), Some(TableItem::ThisRow));
        assert_eq!(TableItem::from_text("#Everything"), None);
    }

    #[test]
    fn unary_positions() {
        assert!(TokenKind::Comma.allows_unary_after());
        assert!(TokenKind::OpeningEnumerable.allows_unary_after());
        assert!(!TokenKind::ClosingParenthesis.allows_unary_after());
        assert!(!TokenKind::Integer.allows_unary_after());
    }

    #[test]
    fn error_kinds() {
        assert!(TokenKind::InvalidReference.is_error());
        assert!(TokenKind::Null.is_error());
        assert!(TokenKind::ErrorValue.is_error());
        assert!(!TokenKind::NameValue.is_error());
        assert!(!TokenKind::String.is_error());
    }
}
