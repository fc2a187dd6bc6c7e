use formref_common::SheetId;
use thiserror::Error;

/// Errors returned when populating a [`MemoryCatalog`](crate::MemoryCatalog).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("name cannot be empty")]
    EmptyName,

    #[error("sheet '{name}' conflicts with existing sheet '{existing}'")]
    DuplicateSheet { name: String, existing: String },

    #[error("workbook already has {max} sheets")]
    TooManySheets { max: usize },

    #[error("name '{name}' is already defined in this scope")]
    DuplicateName { name: String },

    #[error("table collision under normalization: '{name}' conflicts with '{existing}'")]
    DuplicateTable { name: String, existing: String },

    #[error("unknown sheet id {0}")]
    UnknownSheet(SheetId),

    #[error("table '{name}' has an invalid range: {reason}")]
    InvalidTableRange { name: String, reason: &'static str },
}
