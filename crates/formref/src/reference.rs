use formref_common::{ExternalLinkId, LiteralValue, RangeArea, SheetId};
use smallvec::SmallVec;

/// A single cell reference with independent row/column anchoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub external: Option<ExternalLinkId>,
    /// `None` when the address names a sheet the catalog does not know.
    pub sheet: Option<SheetId>,
    pub row: i32,
    pub col: i32,
    pub row_fixed: bool,
    pub col_fixed: bool,
}

impl CellAddress {
    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.row_fixed && self.col_fixed
    }
}

/// The areas of a range reference. Almost always exactly one.
pub type RangeAreas = SmallVec<[RangeArea; 1]>;

/// What a span of tokens refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceInfo {
    CellAddress(CellAddress),
    /// One or more rectangles; a multi-area name yields several.
    RangeReference(RangeAreas),
    /// A name bound to a constant.
    FixedValue(LiteralValue),
    /// A name bound to formula text, substituted verbatim.
    NamedFormula(String),
}

impl ReferenceInfo {
    pub fn range(area: RangeArea) -> Self {
        ReferenceInfo::RangeReference(smallvec::smallvec![area])
    }

    /// True when relocating the formula cannot change this reference.
    ///
    /// Named formulas are never considered fixed: their text may hold relative
    /// references that are not tracked here.
    pub fn is_fixed(&self) -> bool {
        match self {
            ReferenceInfo::CellAddress(cell) => cell.is_fixed(),
            ReferenceInfo::RangeReference(areas) => areas.iter().all(RangeArea::is_fully_fixed),
            ReferenceInfo::FixedValue(_) => true,
            ReferenceInfo::NamedFormula(_) => false,
        }
    }

    /// The rectangles of a range reference; empty for every other kind.
    pub fn areas(&self) -> &[RangeArea] {
        match self {
            ReferenceInfo::RangeReference(areas) => areas,
            _ => &[],
        }
    }

    pub fn as_cell(&self) -> Option<&CellAddress> {
        match self {
            ReferenceInfo::CellAddress(cell) => Some(cell),
            _ => None,
        }
    }
}

/// A resolved reference and the inclusive token span it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedReference {
    pub start: usize,
    pub end: usize,
    pub info: ReferenceInfo,
}

impl ResolvedReference {
    pub fn new(start: usize, end: usize, info: ReferenceInfo) -> Self {
        debug_assert!(start <= end);
        ResolvedReference { start, end, info }
    }

    pub fn span(&self) -> std::ops::RangeInclusive<usize> {
        self.start..=self.end
    }
}
