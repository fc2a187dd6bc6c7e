use std::fmt::{self, Display};

use bitflags::bitflags;
use formref_common::ErrorLiteral;

use crate::address::{is_name, is_valid_cell_address};
use crate::structured::split_name_lexeme;
use crate::vocabulary::{TokenKind, is_address_qualifier, punctuation, two_char_operator};

bitflags! {
    /// What kinds of characters went into the lexeme being accumulated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LexemeFlags: u8 {
        /// Accumulated inside a `"..."` literal.
        const STRING = 0x01;
        /// Saw `!`, `$`, `:`, brackets or a quoted sheet name.
        const ADDRESS = 0x02;
        const NON_NUMERIC = 0x04;
        const NUMERIC = 0x08;
        /// Saw a `.`.
        const DECIMAL = 0x10;
    }
}

#[inline]
fn char_flag(c: char) -> LexemeFlags {
    if c.is_ascii_digit() {
        LexemeFlags::NUMERIC
    } else if c == '.' {
        LexemeFlags::DECIMAL
    } else if is_address_qualifier(c) {
        LexemeFlags::ADDRESS
    } else {
        LexemeFlags::NON_NUMERIC
    }
}

/// The flags a plain (unquoted, unbracketed) lexeme would accumulate.
pub fn scan_flags(text: &str) -> LexemeFlags {
    text.chars().fold(LexemeFlags::empty(), |acc, c| acc | char_flag(c))
}

/// A token in a formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    /// Index of this token in its stream.
    pub position: usize,
    /// Set on an `OFFSET` function (or address) that computes the far end of a
    /// range, as in `A1:OFFSET(...)`.
    pub range_offset: bool,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} value: {}", self.kind, self.value)?;
        if self.range_offset {
            f.write_str(" range-offset")?;
        }
        f.write_str(">")
    }
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind, position: usize) -> Self {
        Token {
            value: value.into(),
            kind,
            position,
            range_offset: false,
        }
    }

    pub fn is_function_named(&self, name: &str) -> bool {
        self.kind == TokenKind::Function && self.value.eq_ignore_ascii_case(name)
    }
}

/// Tokenize `formula` in one pass. Never fails; malformed input yields a
/// best-effort stream.
pub fn tokenize(formula: &str) -> Vec<Token> {
    Tokenizer::new(formula).into_tokens()
}

/// Classify a complete lexeme given the characters that went into it.
pub fn classify_lexeme(text: &str, flags: LexemeFlags) -> TokenKind {
    if let Some(error) = error_suffix(text) {
        return match error {
            ErrorLiteral::Ref => TokenKind::InvalidReference,
            ErrorLiteral::Num => TokenKind::NumericError,
            ErrorLiteral::Value => TokenKind::ValueDataTypeError,
            ErrorLiteral::Null => TokenKind::Null,
            _ => TokenKind::ErrorValue,
        };
    }

    if flags.contains(LexemeFlags::ADDRESS) {
        return if is_name(text) {
            TokenKind::NameValue
        } else {
            TokenKind::ExcelAddress
        };
    }

    if flags.contains(LexemeFlags::NON_NUMERIC) {
        return if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
            TokenKind::Boolean
        } else if is_scientific_number(text) {
            TokenKind::Decimal
        } else if is_valid_cell_address(text) {
            TokenKind::ExcelAddress
        } else {
            TokenKind::NameValue
        };
    }

    if text.ends_with('%') {
        TokenKind::Percent
    } else if flags.contains(LexemeFlags::DECIMAL) {
        TokenKind::Decimal
    } else {
        TokenKind::Integer
    }
}

/// An error literal at the end of `text`, either bare or after a sheet
/// qualifier (`Sheet1!#REF!`).
fn error_suffix(text: &str) -> Option<ErrorLiteral> {
    let idx = text.find('#')?;
    if idx > 0 && !text[..idx].ends_with('!') {
        return None;
    }
    ErrorLiteral::parse(&text[idx..])
}

/// `1E`, `2.5e`: a mantissa waiting for its exponent sign.
fn is_scientific_base(buffer: &str) -> bool {
    let bytes = buffer.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_digit() {
        return false;
    }
    if !matches!(bytes[bytes.len() - 1], b'E' | b'e') {
        return false;
    }
    let mut dot_seen = false;
    for &b in &bytes[1..bytes.len() - 1] {
        match b {
            b'0'..=b'9' => {}
            b'.' if !dot_seen => dot_seen = true,
            _ => return false,
        }
    }
    true
}

fn is_scientific_number(text: &str) -> bool {
    let Some(e) = text.find(['E', 'e']) else {
        return false;
    };
    let (mantissa, exponent) = (&text[..=e], &text[e + 1..]);
    let exponent = exponent.strip_prefix(['+', '-']).unwrap_or(exponent);
    is_scientific_base(mantissa)
        && !exponent.is_empty()
        && exponent.bytes().all(|b| b.is_ascii_digit())
}

/// A single-pass formula tokenizer.
///
/// Scans characters left to right with at most two characters of lookahead.
/// String, quoted-sheet and bracket modes suspend normal punctuation splitting.
pub struct Tokenizer {
    formula: String,
    pub items: Vec<Token>,
    buffer: String,
    flags: LexemeFlags,
    negator_pending: bool,
    in_string: bool,
    in_quoted_name: bool,
    bracket_depth: u32,
}

impl Tokenizer {
    /// Create a new tokenizer and immediately tokenize the formula.
    pub fn new(formula: &str) -> Self {
        let mut tokenizer = Tokenizer {
            formula: formula.to_string(),
            items: Vec::with_capacity(formula.len() / 2),
            buffer: String::new(),
            flags: LexemeFlags::empty(),
            negator_pending: false,
            in_string: false,
            in_quoted_name: false,
            bracket_depth: 0,
        };
        tokenizer.parse();
        tokenizer
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.items
    }

    /// Canonical formula text for the tokens, without a leading `=`.
    pub fn render(&self) -> String {
        crate::render::render(&self.items)
    }

    fn parse(&mut self) {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("tokenize", len = self.formula.len()).entered();

        let chars: Vec<char> = self.formula.chars().collect();
        let mut i = 0;
        // A stored formula's `=` and a redundant leading `+` carry nothing.
        if matches!(chars.first(), Some('+' | '=')) {
            i = 1;
        }

        while i < chars.len() {
            i += if self.in_string {
                self.scan_string(&chars, i)
            } else if self.in_quoted_name {
                self.scan_quoted_name(chars[i])
            } else if self.bracket_depth > 0 {
                self.scan_bracket(&chars, i)
            } else {
                self.scan_plain(&chars, i)
            };
        }

        self.flush(None);
    }

    fn scan_string(&mut self, chars: &[char], i: usize) -> usize {
        if chars[i] != '"' {
            self.buffer.push(chars[i]);
            return 1;
        }
        if chars.get(i + 1) == Some(&'"') {
            self.buffer.push('"');
            return 2;
        }
        self.in_string = false;
        self.flush(Some('"'));
        self.push("\"", TokenKind::String);
        1
    }

    fn scan_quoted_name(&mut self, c: char) -> usize {
        self.buffer.push(c);
        self.flags |= LexemeFlags::ADDRESS;
        if c == '\'' {
            self.in_quoted_name = false;
        }
        1
    }

    fn scan_bracket(&mut self, chars: &[char], i: usize) -> usize {
        let c = chars[i];
        self.buffer.push(c);
        match c {
            '[' => self.bracket_depth += 1,
            ']' => self.bracket_depth -= 1,
            '\'' => {
                if let Some(&next) = chars.get(i + 1) {
                    self.buffer.push(next);
                    return 2;
                }
            }
            _ => {}
        }
        1
    }

    fn scan_plain(&mut self, chars: &[char], i: usize) -> usize {
        let c = chars[i];
        match c {
            '"' => {
                self.flush(Some(c));
                self.push("\"", TokenKind::String);
                self.in_string = true;
                self.flags = LexemeFlags::STRING;
                1
            }
            '\'' => {
                self.buffer.push(c);
                self.flags |= LexemeFlags::ADDRESS;
                self.in_quoted_name = true;
                1
            }
            '[' => {
                self.buffer.push(c);
                self.flags |= LexemeFlags::ADDRESS;
                self.bracket_depth = 1;
                1
            }
            ':' if self.buffer.is_empty()
                && self.last_kind() == Some(TokenKind::ClosingParenthesis) =>
            {
                self.flush(Some(c));
                self.push(":", TokenKind::Colon);
                self.tag_range_offset();
                1
            }
            '#' if self.buffer.is_empty() || self.buffer.ends_with('!') => {
                let ahead: String = chars[i..].iter().take(16).collect();
                match ErrorLiteral::match_prefix(&ahead) {
                    Some(error) => {
                        let len = error.as_str().chars().count();
                        self.buffer.extend(&chars[i..i + len]);
                        self.flags |= LexemeFlags::NON_NUMERIC;
                        len
                    }
                    None => {
                        self.accumulate(c);
                        1
                    }
                }
            }
            '+' | '-' if is_scientific_base(&self.buffer) => {
                self.buffer.push(c);
                1
            }
            '-' => {
                self.flush(Some(c));
                self.negator_pending = true;
                1
            }
            '+' => {
                self.flush(Some(c));
                if !self.in_unary_position() {
                    self.push("+", TokenKind::Operator);
                }
                1
            }
            _ => {
                if let Some(op) = chars.get(i + 1).and_then(|&next| two_char_operator(c, next)) {
                    self.flush(Some(c));
                    self.push(op, TokenKind::Operator);
                    return 2;
                }
                match punctuation(c) {
                    Some(TokenKind::WhiteSpace) => self.flush(Some(c)),
                    Some(kind) => {
                        self.flush(Some(c));
                        self.push(c.to_string(), kind);
                    }
                    None => self.accumulate(c),
                }
                1
            }
        }
    }

    #[inline]
    fn accumulate(&mut self, c: char) {
        self.buffer.push(c);
        self.flags |= char_flag(c);
    }

    #[inline]
    fn last_kind(&self) -> Option<TokenKind> {
        self.items.last().map(|t| t.kind)
    }

    /// A `-` or `+` here would be a sign, not a binary operator.
    #[inline]
    fn in_unary_position(&self) -> bool {
        self.items.last().is_none_or(|t| t.kind.allows_unary_after())
    }

    fn push(&mut self, value: impl Into<String>, kind: TokenKind) {
        let position = self.items.len();
        self.items.push(Token::new(value, kind, position));
    }

    fn push_range_offset(&mut self, value: impl Into<String>, kind: TokenKind, tagged: bool) {
        self.push(value, kind);
        if let Some(token) = self.items.last_mut() {
            token.range_offset = tagged;
        }
    }

    /// Emit a pending negator, then the accumulated lexeme classified against
    /// `next`, the character that ended it.
    fn flush(&mut self, next: Option<char>) {
        if self.negator_pending {
            self.negator_pending = false;
            let kind = if self.in_unary_position() {
                TokenKind::Negator
            } else {
                TokenKind::Operator
            };
            self.push("-", kind);
        }

        let flags = std::mem::take(&mut self.flags);
        if self.buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buffer);

        if flags.contains(LexemeFlags::STRING) {
            self.push(text, TokenKind::StringContent);
        } else if next == Some('(') {
            self.push_function(text);
        } else {
            self.push_lexeme(text, flags);
        }
    }

    fn push_lexeme(&mut self, text: String, flags: LexemeFlags) {
        match classify_lexeme(&text, flags) {
            TokenKind::NameValue => {
                for (value, kind) in split_name_lexeme(&text) {
                    self.push(value, kind);
                }
            }
            kind => self.push(text, kind),
        }
    }

    fn push_function(&mut self, text: String) {
        if let Some((start, name)) = text.rsplit_once(':') {
            if !start.is_empty() && name.eq_ignore_ascii_case("OFFSET") {
                let start = start.to_string();
                let name = name.to_string();
                let flags = scan_flags(&start);
                self.push_lexeme(start, flags);
                self.push(":", TokenKind::Colon);
                self.push_range_offset(name, TokenKind::Function, true);
                return;
            }
        }
        let tagged =
            text.eq_ignore_ascii_case("OFFSET") && self.last_kind() == Some(TokenKind::Colon);
        self.push_range_offset(text, TokenKind::Function, tagged);
    }

    /// After `...):`, mark the `OFFSET` call that produced the range start.
    fn tag_range_offset(&mut self) {
        let end = self.items.len().saturating_sub(1);
        let mut depth: i32 = 0;
        for token in self.items[..end].iter_mut().rev() {
            match token.kind {
                TokenKind::ClosingParenthesis => depth += 1,
                TokenKind::OpeningParenthesis => {
                    depth -= 1;
                    if depth < 0 {
                        break;
                    }
                }
                TokenKind::Function if depth == 0 && token.value.eq_ignore_ascii_case("OFFSET") => {
                    token.range_offset = true;
                    #[cfg(feature = "tracing")]
                    tracing::trace!(position = token.position, "range continues through OFFSET");
                    break;
                }
                _ => {}
            }
        }
    }
}

impl From<&str> for Tokenizer {
    fn from(value: &str) -> Self {
        Tokenizer::new(value)
    }
}

impl From<String> for Tokenizer {
    fn from(value: String) -> Self {
        Tokenizer::new(&value)
    }
}
