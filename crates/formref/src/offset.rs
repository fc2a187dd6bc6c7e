//! Relocation of resolved references when a formula moves to another cell.

use formref_common::{FixedFlags, RangeArea};

use crate::reference::{CellAddress, ReferenceInfo};

/// A row/column shift, applied only to coordinates that are not fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffsetDelta {
    pub rows: i32,
    pub cols: i32,
}

impl OffsetDelta {
    pub fn new(rows: i32, cols: i32) -> Self {
        OffsetDelta { rows, cols }
    }

    /// The shift that takes a formula from cumulative offset `from` to `to`.
    pub fn between(from: (i32, i32), to: (i32, i32)) -> Self {
        OffsetDelta {
            rows: to.0.saturating_sub(from.0),
            cols: to.1.saturating_sub(from.1),
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.rows == 0 && self.cols == 0
    }

    pub fn adjust_cell(&self, cell: &mut CellAddress) {
        if !cell.row_fixed {
            cell.row = cell.row.saturating_add(self.rows);
        }
        if !cell.col_fixed {
            cell.col = cell.col.saturating_add(self.cols);
        }
    }

    /// Shift each bound of `area` unless its fixed bit is set. Sentinel areas
    /// do not move.
    pub fn adjust_area(&self, area: &mut RangeArea) {
        if area.is_invalid() {
            return;
        }
        let shift = |value: i32, fixed: bool, by: i32| {
            if fixed { value } else { value.saturating_add(by) }
        };
        let f = area.fixed;
        area.from_row = shift(area.from_row, f.contains(FixedFlags::FROM_ROW), self.rows);
        area.to_row = shift(area.to_row, f.contains(FixedFlags::TO_ROW), self.rows);
        area.from_col = shift(area.from_col, f.contains(FixedFlags::FROM_COL), self.cols);
        area.to_col = shift(area.to_col, f.contains(FixedFlags::TO_COL), self.cols);
    }

    /// Values and named formulas do not move.
    pub fn adjust(&self, info: &mut ReferenceInfo) {
        match info {
            ReferenceInfo::CellAddress(cell) => self.adjust_cell(cell),
            ReferenceInfo::RangeReference(areas) => {
                for area in areas.iter_mut() {
                    self.adjust_area(area);
                }
            }
            ReferenceInfo::FixedValue(_) | ReferenceInfo::NamedFormula(_) => {}
        }
    }
}
