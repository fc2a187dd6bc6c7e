//! Resolution of a structured-reference clause (`Table1[[#Data],[Qty]]`)
//! against a table definition.

use formref_common::{FixedFlags, INVALID_ROW, RangeArea};
use formref_parse::{TableItem, Token, TokenKind};

use crate::catalog::TableDefinition;
use crate::formula::Anchor;

/// Index of the `ClosingBracket` that balances the `OpeningBracket` at `open`.
pub(crate) fn clause_end(tokens: &[Token], open: usize) -> Option<usize> {
    let mut depth = 0u32;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::OpeningBracket => depth += 1,
            TokenKind::ClosingBracket => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Row bounds while a clause is scanned. `0` is unset, `-1` is the sentinel.
#[derive(Debug, Clone, Copy, Default)]
struct Rows {
    from: i32,
    to: i32,
}

impl Rows {
    const INVALID: Rows = Rows {
        from: INVALID_ROW,
        to: INVALID_ROW,
    };

    // Table rows are always >= 1, so the marker is unambiguous here.
    #[inline]
    fn is_invalid(&self) -> bool {
        self.from == INVALID_ROW && self.to == INVALID_ROW
    }

    #[inline]
    fn single(row: i32) -> Rows {
        Rows { from: row, to: row }
    }
}

fn apply_item(
    item: TableItem,
    table: &TableDefinition,
    anchor: &Anchor,
    rows: &mut Rows,
    fixed: &mut FixedFlags,
) {
    let data = table.data_range();
    match item {
        TableItem::All => {
            *rows = Rows {
                from: table.from_row as i32,
                to: table.to_row as i32,
            }
        }
        TableItem::Headers => match table.header_row() {
            Some(header) => {
                rows.from = header as i32;
                if rows.to == 0 {
                    rows.to = header as i32;
                }
            }
            None if rows.from == 0 => *rows = Rows::INVALID,
            None => {}
        },
        TableItem::Data => {
            if rows.from <= 0 || data.from_row < rows.from {
                rows.from = data.from_row;
            }
            if data.to_row > rows.to {
                rows.to = data.to_row;
            }
        }
        TableItem::Totals => match table.totals_row() {
            Some(totals) => {
                if rows.from <= 0 {
                    rows.from = totals as i32;
                }
                rows.to = totals as i32;
            }
            None if rows.from == 0 => *rows = Rows::INVALID,
            None => {}
        },
        TableItem::ThisRow => {
            let row = anchor.row as i32;
            if anchor.sheet == table.sheet && (data.from_row..=data.to_row).contains(&row) {
                *rows = Rows::single(row);
                // Only the columns are pinned; the row follows the formula.
                *fixed = FixedFlags::FROM_COL | FixedFlags::TO_COL;
            } else {
                *rows = Rows::INVALID;
            }
        }
    }
}

/// Resolve the clause whose opening bracket is at `open`.
///
/// Returns the area and the index of the closing bracket, or `None` when the
/// clause never closes. Unknown items and columns, and parts the table does
/// not have, give an area whose rows are the `-1` sentinel.
pub(crate) fn resolve_clause(
    table: &TableDefinition,
    tokens: &[Token],
    open: usize,
    anchor: &Anchor,
) -> Option<(RangeArea, usize)> {
    let end = clause_end(tokens, open)?;

    let mut rows = Rows::default();
    let (mut from_col, mut to_col) = (0i32, 0i32);
    let mut fixed = FixedFlags::all();
    let mut extend = false;
    let mut unknown = false;

    for token in &tokens[open + 1..end] {
        match token.kind {
            TokenKind::TablePart => match TableItem::from_text(&token.value) {
                Some(item) => apply_item(item, table, anchor, &mut rows, &mut fixed),
                None => unknown = true,
            },
            TokenKind::TableColumn => {
                match table.column_position(&token.value) {
                    Some(col) if extend => to_col = col as i32,
                    Some(col) => (from_col, to_col) = (col as i32, col as i32),
                    None => unknown = true,
                }
                extend = false;
            }
            TokenKind::Colon => extend = true,
            TokenKind::OpeningBracket | TokenKind::ClosingBracket => {}
            _ => extend = false,
        }
    }

    if unknown {
        rows = Rows::INVALID;
    }

    let data = table.data_range();
    if rows.from == 0 {
        rows.from = data.from_row;
    }
    if rows.to == 0 {
        rows.to = data.to_row;
    }
    if from_col == 0 {
        from_col = data.from_col;
    }
    if to_col == 0 {
        to_col = data.to_col;
    }
    if from_col > to_col {
        std::mem::swap(&mut from_col, &mut to_col);
    }

    let area = if rows.is_invalid() {
        RangeArea::sentinel(from_col, to_col, fixed)
    } else {
        RangeArea::new(rows.from, from_col, rows.to, to_col, fixed)
    }
    .with_sheet(Some(table.sheet));
    Some((area, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use formref_parse::tokenize;

    fn table() -> TableDefinition {
        // Header on row 2, data rows 3..=9, totals on row 10, columns B..=D.
        TableDefinition::new(
            "T",
            0,
            (2, 2),
            (10, 4),
            vec!["Region".into(), "Qty".into(), "Price".into()],
        )
        .with_totals_row(true)
    }

    fn resolve(formula: &str, table: &TableDefinition, anchor: Anchor) -> Option<RangeArea> {
        let tokens = tokenize(formula);
        let open = tokens
            .iter()
            .position(|t| t.kind == TokenKind::OpeningBracket)?;
        resolve_clause(table, &tokens, open, &anchor).map(|(area, _)| area)
    }

    fn bounds(area: RangeArea) -> (i32, i32, i32, i32) {
        (area.from_row, area.from_col, area.to_row, area.to_col)
    }

    const ANCHOR: Anchor = Anchor {
        sheet: 0,
        row: 5,
        col: 8,
    };

    #[test]
    fn parts() {
        let t = table();
        assert_eq!(bounds(resolve("T[#All]", &t, ANCHOR).unwrap()), (2, 2, 10, 4));
        assert_eq!(bounds(resolve("T[#Headers]", &t, ANCHOR).unwrap()), (2, 2, 2, 4));
        assert_eq!(bounds(resolve("T[#Data]", &t, ANCHOR).unwrap()), (3, 2, 9, 4));
        assert_eq!(bounds(resolve("T[#Totals]", &t, ANCHOR).unwrap()), (10, 2, 10, 4));
        assert_eq!(
            bounds(resolve("T[[#Headers],[#Data]]", &t, ANCHOR).unwrap()),
            (2, 2, 9, 4)
        );
        assert_eq!(
            bounds(resolve("T[[#Data],[#Totals]]", &t, ANCHOR).unwrap()),
            (3, 2, 10, 4)
        );
    }

    #[test]
    fn missing_parts_give_the_sentinel() {
        let t = table().with_header_row(false).with_totals_row(false);
        assert!(resolve("T[#Headers]", &t, ANCHOR).unwrap().is_invalid());
        assert!(resolve("T[#Totals]", &t, ANCHOR).unwrap().is_invalid());
        assert!(resolve("T[#Everything]", &t, ANCHOR).unwrap().is_invalid());
        assert!(resolve("T[NoSuchColumn]", &t, ANCHOR).unwrap().is_invalid());
        // A later part that exists still wins over a missing header.
        assert!(!resolve("T[[#Headers],[#Data]]", &t, ANCHOR).unwrap().is_invalid());
    }

    #[test]
    fn columns_and_column_ranges() {
        let t = table();
        let area = resolve("T[Qty]", &t, ANCHOR).unwrap();
        assert_eq!(bounds(area), (3, 3, 9, 3));
        assert!(area.fixed.is_all());
        assert_eq!(area.sheet, Some(0));

        assert_eq!(
            bounds(resolve("T[[Region]:[Price]]", &t, ANCHOR).unwrap()),
            (3, 2, 9, 4)
        );
        assert_eq!(
            bounds(resolve("T[[Price]:[Region]]", &t, ANCHOR).unwrap()),
            (3, 2, 9, 4)
        );
        assert_eq!(
            bounds(resolve("T[[#Totals],[Qty]:[Price]]", &t, ANCHOR).unwrap()),
            (10, 3, 10, 4)
        );
    }

    #[test]
    fn colon_extends_exactly_one_column() {
        let t = table();
        // The comma ends range-extend mode; Price then sets both bounds.
        assert_eq!(
            bounds(resolve("T[[Region]:[Qty],[Price]]", &t, ANCHOR).unwrap()),
            (3, 4, 9, 4)
        );
    }

    #[test]
    fn this_row() {
        let t = table();
        let area = resolve("T[@Qty]", &t, ANCHOR).unwrap();
        assert_eq!(bounds(area), (5, 3, 5, 3));
        assert_eq!(area.fixed, FixedFlags::FROM_COL | FixedFlags::TO_COL);

        let outside = Anchor { row: 10, ..ANCHOR };
        assert!(resolve("T[[#This Row],[Qty]]", &t, outside).unwrap().is_invalid());
        let other_sheet = Anchor { sheet: 1, ..ANCHOR };
        assert!(resolve("T[@Qty]", &t, other_sheet).unwrap().is_invalid());
    }

    #[test]
    fn unterminated_clause_resolves_nothing() {
        assert!(resolve("T[[#Data],[Qty]", &table(), ANCHOR).is_none());
    }
}
