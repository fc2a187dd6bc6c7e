//! A tokenized formula bound to the cell it lives in, with its resolved
//! references and the offset it has been relocated by.

use std::fmt;

use formref_common::SheetId;
use formref_parse::{Token, Tokenizer};

use crate::catalog::ReferenceCatalog;
use crate::offset::OffsetDelta;
use crate::reference::ResolvedReference;
use crate::resolver::{ReferenceMap, resolve_references};

/// The cell a formula is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor {
    pub sheet: SheetId,
    pub row: u32,
    pub col: u32,
}

impl Anchor {
    pub const fn new(sheet: SheetId, row: u32, col: u32) -> Self {
        Anchor { sheet, row, col }
    }
}

#[derive(Debug, Clone)]
pub struct Formula {
    text: String,
    anchor: Anchor,
    tokens: Vec<Token>,
    references: ReferenceMap,
    offset: (i32, i32),
}

impl Formula {
    /// Tokenize `text` and resolve its references as seen from `anchor`.
    ///
    /// Never fails: anything that cannot be resolved is simply absent from
    /// [`Formula::references`].
    pub fn parse<C: ReferenceCatalog + ?Sized>(text: &str, anchor: Anchor, catalog: &mut C) -> Self {
        let tokens = Tokenizer::new(text).into_tokens();
        let references = resolve_references(&tokens, anchor, catalog);
        Formula {
            text: text.to_string(),
            anchor,
            tokens,
            references,
            offset: (0, 0),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Resolved references in token order.
    pub fn references(&self) -> impl Iterator<Item = &ResolvedReference> {
        self.references.values()
    }

    /// The reference whose span starts at token `start`.
    pub fn reference_at(&self, start: usize) -> Option<&ResolvedReference> {
        self.references.get(&start)
    }

    /// The reference whose span includes token `index`.
    pub fn reference_covering(&self, index: usize) -> Option<&ResolvedReference> {
        self.references
            .range(..=index)
            .next_back()
            .map(|(_, r)| r)
            .filter(|r| r.end >= index)
    }

    /// Cumulative `(rows, cols)` offset currently applied.
    pub fn offset(&self) -> (i32, i32) {
        self.offset
    }

    /// Relocate the formula so that it sits `rows`/`cols` away from where it
    /// was parsed. The offset is absolute, not incremental: applying the same
    /// offset twice is the same as applying it once.
    pub fn apply_offset(&mut self, rows: i32, cols: i32) {
        let delta = OffsetDelta::between(self.offset, (rows, cols));
        #[cfg(feature = "tracing")]
        tracing::debug!(rows, cols, delta_rows = delta.rows, delta_cols = delta.cols, "apply_offset");
        if !delta.is_zero() {
            for reference in self.references.values_mut() {
                delta.adjust(&mut reference.info);
            }
        }
        self.offset = (rows, cols);
    }

    /// True when no reference can change under relocation.
    pub fn is_fixed(&self) -> bool {
        self.references.values().all(|r| r.info.is_fixed())
    }

    /// Formula text rebuilt from the tokens.
    pub fn render(&self) -> String {
        formref_parse::render(&self.tokens)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MemoryCatalog, NameDefinition, NameScope};
    use crate::reference::ReferenceInfo;
    use formref_common::LiteralValue;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog.add_sheet("Sheet1").unwrap();
        catalog
    }

    #[test]
    fn offsets_are_absolute() {
        let mut catalog = catalog();
        let mut formula = Formula::parse("A1+$B$2", Anchor::new(0, 1, 3), &mut catalog);
        formula.apply_offset(2, 1);
        formula.apply_offset(2, 1);
        let cell = formula.reference_at(0).and_then(|r| r.info.as_cell()).unwrap();
        assert_eq!((cell.row, cell.col), (3, 2));
        let fixed = formula.reference_at(2).and_then(|r| r.info.as_cell()).unwrap();
        assert_eq!((fixed.row, fixed.col), (2, 2));

        formula.apply_offset(0, 0);
        let cell = formula.reference_at(0).and_then(|r| r.info.as_cell()).unwrap();
        assert_eq!((cell.row, cell.col), (1, 1));
        assert_eq!(formula.offset(), (0, 0));
    }

    #[test]
    fn covering_lookup() {
        let mut catalog = catalog();
        catalog
            .define_name(
                "Rate",
                NameScope::Sheet(0),
                NameDefinition::Value(LiteralValue::Number(0.2)),
            )
            .unwrap();
        // SUM ( Sheet1 Rate )
        let formula = Formula::parse("SUM(Sheet1!Rate)", Anchor::new(0, 1, 1), &mut catalog);
        let reference = formula.reference_covering(3).unwrap();
        assert_eq!(reference.span(), 2..=3);
        assert_eq!(reference.info, ReferenceInfo::FixedValue(LiteralValue::Number(0.2)));
        assert_eq!(formula.reference_covering(2), Some(reference));
        assert!(formula.reference_covering(1).is_none());
        assert!(formula.reference_covering(4).is_none());
    }

    #[test]
    fn renders_back_to_text() {
        let mut catalog = catalog();
        let formula = Formula::parse("=SUM(A1, 2)", Anchor::new(0, 1, 1), &mut catalog);
        assert_eq!(formula.to_string(), formula.render());
        assert_eq!(formula.text(), "=SUM(A1, 2)");
        assert_eq!(formula.anchor(), Anchor::new(0, 1, 1));
    }
}
