//! A1 address validation and parsing.

use formref_common::{
    CoordError, FixedFlags, MAX_COLUMN_LETTERS, MAX_COLUMNS, MAX_ROWS, check_row,
    letters_to_column,
};

/// True iff `s` is a bare cell address: 1-3 letters naming a column inside the
/// sheet, followed by digits naming a row inside the sheet. No `$`, no sheet.
pub fn is_valid_cell_address(s: &str) -> bool {
    let letters = s.bytes().take_while(u8::is_ascii_alphabetic).count();
    if letters == 0 || letters > MAX_COLUMN_LETTERS {
        return false;
    }
    let digits = &s[letters..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    letters_to_column(&s[..letters]).is_ok()
        && digits
            .parse::<u64>()
            .ok()
            .and_then(|row| check_row(row).ok())
            .is_some()
}

/// Decide whether an address-flagged lexeme is a defined name rather than an
/// address. The worksheet qualifier is ignored; bracket clauses are structured
/// references (names), `:`/`$` forms are addresses.
pub fn is_name(s: &str) -> bool {
    let (_, rest) = split_qualifier(s);
    if rest.contains(['[', ']']) {
        return true;
    }
    if rest.contains([':', '$']) {
        return false;
    }
    !is_valid_cell_address(rest)
}

/// Split `Sheet1!A1` at the last `!` that sits outside quotes and brackets.
pub fn split_qualifier(s: &str) -> (Option<&str>, &str) {
    let mut depth = 0u32;
    let mut quoted = false;
    let mut split = None;
    for (i, c) in s.char_indices() {
        match c {
            '\'' if depth == 0 => quoted = !quoted,
            '[' if !quoted => depth += 1,
            ']' if !quoted => depth = depth.saturating_sub(1),
            '!' if !quoted && depth == 0 => split = Some(i),
            _ => {}
        }
    }
    match split {
        Some(i) => (Some(&s[..i]), &s[i + 1..]),
        None => (None, s),
    }
}

/// The parts of a `[link]Sheet` / `'My Sheet'` qualifier, unquoted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetQualifier {
    pub external: Option<String>,
    pub sheet: Option<String>,
}

/// Break a qualifier (text before `!`) into its external link and sheet name.
pub fn parse_qualifier(q: &str) -> SheetQualifier {
    let inner = if q.len() >= 2 && q.starts_with('\'') && q.ends_with('\'') {
        q[1..q.len() - 1].replace("''", "'")
    } else {
        q.to_string()
    };

    let (external, sheet) = match inner.strip_prefix('[').and_then(|s| s.split_once(']')) {
        Some((link, sheet)) => (Some(link.to_string()), sheet.to_string()),
        None => (None, inner),
    };

    SheetQualifier {
        external: external.filter(|e| !e.is_empty()),
        sheet: Some(sheet).filter(|s| !s.is_empty()),
    }
}

/// A single cell with its `$` markers. Row and column are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A1Cell {
    pub row: u32,
    pub col: u32,
    pub row_fixed: bool,
    pub col_fixed: bool,
}

/// What an address denotes once its qualifier is stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum A1Target {
    Cell(A1Cell),
    Area {
        from_row: u32,
        from_col: u32,
        to_row: u32,
        to_col: u32,
        fixed: FixedFlags,
    },
}

/// A parsed `ExcelAddress` lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Reference {
    pub qualifier: Option<SheetQualifier>,
    pub target: A1Target,
}

/// Parse an `ExcelAddress` lexeme such as `$A$1`, `Sheet2!B3:C9`, `A:A` or
/// `'My Sheet'!3:5`.
pub fn parse_reference(s: &str) -> Result<A1Reference, CoordError> {
    let (qualifier, rest) = split_qualifier(s);
    let qualifier = qualifier.map(parse_qualifier);

    let target = match rest.split_once(':') {
        None => A1Target::Cell(parse_cell(rest)?),
        Some((start, end)) => parse_area(start, end)?,
    };
    Ok(A1Reference { qualifier, target })
}

/// Parse `$A$1`-style text into a cell.
pub fn parse_cell(s: &str) -> Result<A1Cell, CoordError> {
    match parse_part(s)? {
        Part {
            col: Some(col),
            row: Some(row),
            col_fixed,
            row_fixed,
        } => Ok(A1Cell {
            row,
            col,
            row_fixed,
            col_fixed,
        }),
        _ => Err(CoordError::InvalidColumnLabel(s.to_string())),
    }
}

struct Part {
    col: Option<u32>,
    row: Option<u32>,
    col_fixed: bool,
    row_fixed: bool,
}

/// One side of a range: `$A$1`, `A`, `$3`, … Either the column or the row may be
/// missing but not both.
fn parse_part(s: &str) -> Result<Part, CoordError> {
    let bytes = s.as_bytes();
    let mut i = 0;

    let col_fixed = bytes.first() == Some(&b'$');
    if col_fixed {
        i += 1;
    }
    let col_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    let col = if i > col_start {
        Some(letters_to_column(&s[col_start..i])?)
    } else {
        None
    };

    let mut row_fixed = false;
    if i < bytes.len() && bytes[i] == b'$' {
        row_fixed = true;
        i += 1;
    }
    let row_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let row = if i > row_start {
        let digits = &s[row_start..i];
        let value = digits
            .parse::<u64>()
            .map_err(|_| CoordError::RowOverflow(u64::MAX))?;
        Some(check_row(value)?)
    } else {
        None
    };

    if i != bytes.len() || (col.is_none() && row.is_none()) {
        return Err(CoordError::InvalidColumnLabel(s.to_string()));
    }
    // A lone `$` before the row number of a row-only part belongs to the row.
    if col.is_none() && col_fixed {
        return Ok(Part {
            col,
            row,
            col_fixed: false,
            row_fixed: true,
        });
    }
    Ok(Part {
        col,
        row,
        col_fixed,
        row_fixed,
    })
}

fn parse_area(start: &str, end: &str) -> Result<A1Target, CoordError> {
    let a = parse_part(start)?;
    let b = parse_part(end)?;

    let (from_row, to_row, from_row_fixed, to_row_fixed) = match (a.row, b.row) {
        (Some(r1), Some(r2)) => order(r1, r2, a.row_fixed, b.row_fixed),
        // Whole columns never move vertically.
        (None, None) => (1, MAX_ROWS, true, true),
        _ => return Err(CoordError::InvalidColumnLabel(format!("{start}:{end}"))),
    };
    let (from_col, to_col, from_col_fixed, to_col_fixed) = match (a.col, b.col) {
        (Some(c1), Some(c2)) => order(c1, c2, a.col_fixed, b.col_fixed),
        (None, None) => (1, MAX_COLUMNS, true, true),
        _ => return Err(CoordError::InvalidColumnLabel(format!("{start}:{end}"))),
    };

    Ok(A1Target::Area {
        from_row,
        from_col,
        to_row,
        to_col,
        fixed: FixedFlags::from_markers(from_row_fixed, from_col_fixed, to_row_fixed, to_col_fixed),
    })
}

#[inline]
fn order(a: u32, b: u32, a_fixed: bool, b_fixed: bool) -> (u32, u32, bool, bool) {
    if a <= b {
        (a, b, a_fixed, b_fixed)
    } else {
        (b, a, b_fixed, a_fixed)
    }
}
