//! Rectangular areas with per-corner fixed (absolute) flags.

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable worksheet identifier (position id in the owning workbook).
pub type SheetId = u16;

/// Identifier of an external workbook link, assigned by the link registry.
pub type ExternalLinkId = u16;

/// Row value marking an area that addresses no cells.
pub const INVALID_ROW: i32 = -1;

bitflags! {
    /// Which bounds of a [`RangeArea`] are absolute (`$`-prefixed).
    ///
    /// A set bit means that coordinate never moves when the owning formula is
    /// relocated.
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FixedFlags: u8 {
        const FROM_ROW = 0x1;
        const FROM_COL = 0x2;
        const TO_ROW = 0x4;
        const TO_COL = 0x8;
    }
}

impl FixedFlags {
    /// Build the flag set from the four `$` markers of an `A1:B2` pair.
    pub fn from_markers(from_row: bool, from_col: bool, to_row: bool, to_col: bool) -> Self {
        let mut flags = FixedFlags::empty();
        flags.set(FixedFlags::FROM_ROW, from_row);
        flags.set(FixedFlags::FROM_COL, from_col);
        flags.set(FixedFlags::TO_ROW, to_row);
        flags.set(FixedFlags::TO_COL, to_col);
        flags
    }
}

/// One rectangle of a (possibly multi-area) range reference.
///
/// Bounds are 1-based and inclusive. `sheet` and `external` are `None` when the
/// area was written without a qualifier that could be resolved.
///
/// An area that addresses no cells carries `invalid`, with both rows set to
/// [`INVALID_ROW`]. Relocation never clears the flag, and a valid area shifted
/// onto row `-1` stays valid.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeArea {
    pub external: Option<ExternalLinkId>,
    pub sheet: Option<SheetId>,
    pub from_row: i32,
    pub from_col: i32,
    pub to_row: i32,
    pub to_col: i32,
    pub fixed: FixedFlags,
    #[cfg_attr(feature = "serde", serde(default))]
    pub invalid: bool,
}

impl RangeArea {
    pub fn new(from_row: i32, from_col: i32, to_row: i32, to_col: i32, fixed: FixedFlags) -> Self {
        RangeArea {
            external: None,
            sheet: None,
            from_row,
            from_col,
            to_row,
            to_col,
            fixed,
            invalid: false,
        }
    }

    /// The sentinel area over columns `from_col..=to_col`.
    pub fn sentinel(from_col: i32, to_col: i32, fixed: FixedFlags) -> Self {
        RangeArea {
            invalid: true,
            ..RangeArea::new(INVALID_ROW, from_col, INVALID_ROW, to_col, fixed)
        }
    }

    pub fn with_sheet(mut self, sheet: Option<SheetId>) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_external(mut self, external: Option<ExternalLinkId>) -> Self {
        self.external = external;
        self
    }

    /// True for the sentinel: the area addresses no cells.
    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    #[inline]
    pub fn is_fully_fixed(&self) -> bool {
        self.fixed.is_all()
    }

    pub fn height(&self) -> i32 {
        self.to_row - self.from_row + 1
    }

    pub fn width(&self) -> i32 {
        self.to_col - self.from_col + 1
    }
}
