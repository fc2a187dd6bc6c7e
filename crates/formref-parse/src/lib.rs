pub mod address;
pub mod render;
pub mod structured;
pub mod tokenizer;
pub mod vocabulary;

pub use address::{
    A1Cell, A1Reference, A1Target, SheetQualifier, is_name, is_valid_cell_address,
    parse_qualifier, parse_reference, split_qualifier,
};
pub use render::render;
pub use structured::split_name_lexeme;
pub use tokenizer::{LexemeFlags, Token, Tokenizer, classify_lexeme, tokenize};
pub use vocabulary::{TableItem, TokenKind};

// Re-export common types
pub use formref_common::{ErrorLiteral, FixedFlags, MAX_COLUMNS, MAX_ROWS};
