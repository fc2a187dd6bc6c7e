//! Reference resolution for spreadsheet formulas.
//!
//! A [`Formula`] is tokenized by `formref-parse`, then every cell address,
//! range, defined name and structured table reference in it is resolved
//! against a [`ReferenceCatalog`] into a [`ReferenceInfo`]. Relative parts of
//! those references follow the formula through [`Formula::apply_offset`].

pub mod catalog;
pub mod error;
pub mod formula;
pub mod offset;
pub mod reference;
pub mod resolver;
mod structured;

pub use catalog::{
    CatalogConfig, DefinedName, MemoryCatalog, NameDefinition, NameScope, NamedArea,
    ReferenceCatalog, TableDefinition,
};
pub use error::CatalogError;
pub use formula::{Anchor, Formula};
pub use offset::OffsetDelta;
pub use reference::{CellAddress, RangeAreas, ReferenceInfo, ResolvedReference};
pub use resolver::{ReferenceMap, resolve_references};

pub use formref_common;
pub use formref_parse;
pub use formref_common::{ExternalLinkId, FixedFlags, INVALID_ROW, LiteralValue, RangeArea, SheetId};
