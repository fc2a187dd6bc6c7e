//! Sheet-size limits and column-letter conversion.
//!
//! Rows and columns are 1-based throughout formref, matching the way they are
//! written in A1 notation: `A1` is row 1, column 1 and `XFD1048576` is the
//! bottom-right cell of a sheet.

use core::fmt;

/// Number of rows in a worksheet.
pub const MAX_ROWS: u32 = 1_048_576;
/// Number of columns in a worksheet (`XFD`).
pub const MAX_COLUMNS: u32 = 16_384;
/// Longest column label that can name a column inside [`MAX_COLUMNS`].
pub const MAX_COLUMN_LETTERS: usize = 3;

/// Errors returned when converting unchecked coordinate text or numbers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CoordError {
    RowOverflow(u64),
    ColOverflow(u64),
    ZeroIndex,
    InvalidColumnLabel(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::RowOverflow(row) => write!(f, "row {row} exceeds {MAX_ROWS}"),
            CoordError::ColOverflow(col) => write!(f, "column {col} exceeds {MAX_COLUMNS}"),
            CoordError::ZeroIndex => write!(f, "row and column indices are 1-based"),
            CoordError::InvalidColumnLabel(label) => {
                write!(f, "'{label}' is not a column label")
            }
        }
    }
}

impl std::error::Error for CoordError {}

/// Validate a 1-based row number.
#[inline]
pub fn check_row(row: u64) -> Result<u32, CoordError> {
    match row {
        0 => Err(CoordError::ZeroIndex),
        r if r > MAX_ROWS as u64 => Err(CoordError::RowOverflow(r)),
        r => Ok(r as u32),
    }
}

/// Validate a 1-based column number.
#[inline]
pub fn check_col(col: u64) -> Result<u32, CoordError> {
    match col {
        0 => Err(CoordError::ZeroIndex),
        c if c > MAX_COLUMNS as u64 => Err(CoordError::ColOverflow(c)),
        c => Ok(c as u32),
    }
}

/// Convert a column label (`A`, `bc`, `XFD`) to its 1-based number.
///
/// Letters are matched case-insensitively. Labels longer than
/// [`MAX_COLUMN_LETTERS`] or past [`MAX_COLUMNS`] are rejected.
pub fn letters_to_column(label: &str) -> Result<u32, CoordError> {
    let bytes = label.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_COLUMN_LETTERS {
        return Err(CoordError::InvalidColumnLabel(label.to_string()));
    }

    let mut col = 0u64;
    for &b in bytes {
        if !b.is_ascii_alphabetic() {
            return Err(CoordError::InvalidColumnLabel(label.to_string()));
        }
        col = col * 26 + (b.to_ascii_uppercase() - b'A' + 1) as u64;
    }
    check_col(col)
}

/// Convert a 1-based column number to its label (`1` → `A`, `28` → `AB`).
pub fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::with_capacity(MAX_COLUMN_LETTERS);
    while col > 0 {
        col -= 1;
        buf.push(b'A' + (col % 26) as u8);
        col /= 26;
    }
    buf.reverse();
    buf.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_label_roundtrip() {
        assert_eq!(column_to_letters(1), "A");
        assert_eq!(column_to_letters(26), "Z");
        assert_eq!(column_to_letters(28), "AB");
        assert_eq!(column_to_letters(MAX_COLUMNS), "XFD");
        assert_eq!(letters_to_column("ab"), Ok(28));
        assert_eq!(letters_to_column("XFD"), Ok(MAX_COLUMNS));
    }

    #[test]
    fn column_label_limits() {
        assert_eq!(
            letters_to_column("XFE"),
            Err(CoordError::ColOverflow(MAX_COLUMNS as u64 + 1))
        );
        assert!(letters_to_column("ABCD").is_err());
        assert!(letters_to_column("A1").is_err());
        assert!(letters_to_column("").is_err());
    }

    #[test]
    fn row_limits() {
        assert_eq!(check_row(1), Ok(1));
        assert_eq!(check_row(MAX_ROWS as u64), Ok(MAX_ROWS));
        assert_eq!(check_row(0), Err(CoordError::ZeroIndex));
        assert_eq!(
            check_row(MAX_ROWS as u64 + 1),
            Err(CoordError::RowOverflow(MAX_ROWS as u64 + 1))
        );
    }
}
