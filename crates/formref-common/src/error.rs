//! Spreadsheet error literals (`#REF!`, `#N/A`, …) as they appear in formula text.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All recognised error codes.
///
/// **Note:** names are CamelCase while `Display` renders them exactly as a
/// spreadsheet shows them (`#DIV/0!`, …).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorLiteral {
    Null,
    Div,
    Value,
    Ref,
    Name,
    Num,
    Na,
    GettingData,
}

impl ErrorLiteral {
    /// Every literal, longest text first so prefix scans never stop early.
    pub const ALL: [ErrorLiteral; 8] = [
        ErrorLiteral::GettingData,
        ErrorLiteral::Value,
        ErrorLiteral::Null,
        ErrorLiteral::Div,
        ErrorLiteral::Name,
        ErrorLiteral::Ref,
        ErrorLiteral::Num,
        ErrorLiteral::Na,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "#NULL!",
            Self::Div => "#DIV/0!",
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::Na => "#N/A",
            Self::GettingData => "#GETTING_DATA",
        }
    }

    /// Case-insensitive parse of a complete error literal.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lit| lit.as_str().eq_ignore_ascii_case(s))
    }

    /// Match an error literal at the very start of `s`, case-insensitively.
    pub fn match_prefix(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lit| {
            let text = lit.as_str();
            s.len() >= text.len()
                && s.is_char_boundary(text.len())
                && s[..text.len()].eq_ignore_ascii_case(text)
        })
    }
}

impl fmt::Display for ErrorLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for ErrorLiteral {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}
