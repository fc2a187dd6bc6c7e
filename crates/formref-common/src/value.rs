use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use crate::ErrorLiteral;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A constant a defined name can be bound to (`TaxRate = 0.2`).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ErrorLiteral),
}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            LiteralValue::Int(i) => i.hash(state),
            LiteralValue::Number(n) => n.to_bits().hash(state),
            LiteralValue::Text(s) => s.hash(state),
            LiteralValue::Boolean(b) => b.hash(state),
            LiteralValue::Error(e) => e.hash(state),
        }
    }
}

impl Eq for LiteralValue {}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Int(i) => write!(f, "{i}"),
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::Text(s) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            LiteralValue::Boolean(true) => f.write_str("TRUE"),
            LiteralValue::Boolean(false) => f.write_str("FALSE"),
            LiteralValue::Error(e) => write!(f, "{e}"),
        }
    }
}

impl From<ErrorLiteral> for LiteralValue {
    fn from(error: ErrorLiteral) -> Self {
        LiteralValue::Error(error)
    }
}
