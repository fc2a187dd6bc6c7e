use std::collections::BTreeMap;

use formref_common::{FixedFlags, RangeArea, SheetId};
use formref_parse::{A1Target, Token, TokenKind, parse_reference};

use crate::catalog::{NameDefinition, NamedArea, ReferenceCatalog};
use crate::formula::Anchor;
use crate::reference::{CellAddress, ReferenceInfo, ResolvedReference};
use crate::structured::{clause_end, resolve_clause};

/// Resolved references keyed by the index of their first token.
pub type ReferenceMap = BTreeMap<usize, ResolvedReference>;

/// Walk `tokens` once and resolve every address, name and structured
/// reference against `catalog`.
pub fn resolve_references<C: ReferenceCatalog + ?Sized>(
    tokens: &[Token],
    anchor: Anchor,
    catalog: &mut C,
) -> ReferenceMap {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("resolve_references", tokens = tokens.len()).entered();

    let mut resolver = Resolver {
        tokens,
        anchor,
        catalog,
        external: None,
        sheet: None,
        span_start: None,
        out: ReferenceMap::new(),
    };
    resolver.run();
    resolver.out
}

struct Resolver<'a, C: ReferenceCatalog + ?Sized> {
    tokens: &'a [Token],
    anchor: Anchor,
    catalog: &'a mut C,
    // Qualifier run preceding the token being resolved.
    external: Option<&'a str>,
    sheet: Option<&'a str>,
    span_start: Option<usize>,
    out: ReferenceMap,
}

impl<'a, C: ReferenceCatalog + ?Sized> Resolver<'a, C> {
    fn run(&mut self) {
        let tokens = self.tokens;
        let mut i = 0;
        while i < tokens.len() {
            let token = &tokens[i];
            match token.kind {
                TokenKind::ExternalReference => {
                    self.external = Some(token.value.as_str());
                    self.span_start.get_or_insert(i);
                }
                TokenKind::WorksheetNameContent => {
                    self.sheet = Some(token.value.as_str());
                    self.span_start.get_or_insert(i);
                }
                TokenKind::ExcelAddress => {
                    self.resolve_address(i);
                    self.clear();
                }
                TokenKind::NameValue => {
                    self.resolve_name(i);
                    self.clear();
                }
                TokenKind::TableName => {
                    i = self.resolve_table(i);
                    self.clear();
                }
                TokenKind::OpeningBracket => {
                    i = self.resolve_anchor_clause(i);
                    self.clear();
                }
                _ => self.clear(),
            }
            i += 1;
        }
    }

    #[inline]
    fn clear(&mut self) {
        self.external = None;
        self.sheet = None;
        self.span_start = None;
    }

    #[inline]
    fn insert(&mut self, start: usize, end: usize, info: ReferenceInfo) {
        self.out.insert(start, ResolvedReference::new(start, end, info));
    }

    fn resolve_address(&mut self, i: usize) {
        let tokens = self.tokens;
        let text = tokens[i].value.as_str();
        let Ok(reference) = parse_reference(text) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(address = text, "address out of range");
            return;
        };

        let (external, sheet) = match &reference.qualifier {
            None => (None, Some(self.anchor.sheet)),
            Some(q) => match q.external.as_deref() {
                Some(path) => (Some(self.catalog.external_link_id(path)), None),
                None => (None, q.sheet.as_deref().and_then(|s| self.catalog.sheet_id(s))),
            },
        };

        let info = match reference.target {
            A1Target::Cell(cell) => ReferenceInfo::CellAddress(CellAddress {
                external,
                sheet,
                row: cell.row as i32,
                col: cell.col as i32,
                row_fixed: cell.row_fixed,
                col_fixed: cell.col_fixed,
            }),
            A1Target::Area {
                from_row,
                from_col,
                to_row,
                to_col,
                fixed,
            } => ReferenceInfo::range(
                RangeArea::new(
                    from_row as i32,
                    from_col as i32,
                    to_row as i32,
                    to_col as i32,
                    fixed,
                )
                .with_sheet(sheet)
                .with_external(external),
            ),
        };
        self.insert(i, i, info);
    }

    fn resolve_name(&mut self, i: usize) {
        let tokens = self.tokens;
        let name = tokens[i].value.as_str();
        let start = self.span_start.unwrap_or(i);

        if self.external.is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!(name, external = ?self.external, "external names are left unresolved");
            return;
        }

        let found = match self.sheet {
            None => self
                .catalog
                .local_name(self.anchor.sheet, name)
                .or_else(|| self.catalog.workbook_name(name)),
            Some(sheet) => self
                .catalog
                .sheet_id(sheet)
                .and_then(|id| self.catalog.local_name(id, name)),
        }
        .map(|n| (n.owner_sheet(), n.definition.clone()));

        let info = match found {
            Some((_, NameDefinition::Value(value))) => ReferenceInfo::FixedValue(value),
            Some((_, NameDefinition::Formula(text))) => ReferenceInfo::NamedFormula(text),
            Some((owner, NameDefinition::Areas(areas))) => ReferenceInfo::RangeReference(
                areas.iter().map(|a| self.named_area(a, owner)).collect(),
            ),
            None => match self.catalog.table(name) {
                // A table used as a plain name is pinned to its data range.
                Some(table) => ReferenceInfo::range(RangeArea {
                    fixed: FixedFlags::all(),
                    ..table.data_range()
                }),
                None => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(name, "unresolved name");
                    return;
                }
            },
        };
        self.insert(start, i, info);
    }

    fn named_area(&mut self, area: &NamedArea, owner: Option<SheetId>) -> RangeArea {
        let external = area
            .external_path
            .as_deref()
            .map(|path| self.catalog.external_link_id(path));
        let sheet = match (&area.sheet, external) {
            // Sheets of other workbooks have no id here.
            (_, Some(_)) => None,
            (Some(name), None) => self.catalog.sheet_id(name),
            (None, None) => Some(owner.unwrap_or(self.anchor.sheet)),
        };
        RangeArea::new(
            area.from_row as i32,
            area.from_col as i32,
            area.to_row as i32,
            area.to_col as i32,
            area.fixed,
        )
        .with_sheet(sheet)
        .with_external(external)
    }

    /// Resolve `Table[...]` or a bare `Table`; returns the index of the last
    /// token consumed.
    fn resolve_table(&mut self, i: usize) -> usize {
        let tokens = self.tokens;
        let name = tokens[i].value.as_str();
        let start = self.span_start.unwrap_or(i);
        let open = i + 1;
        let has_clause = tokens
            .get(open)
            .is_some_and(|t| t.kind == TokenKind::OpeningBracket);

        let Some(table) = self.catalog.table(name) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(table = name, "unknown table");
            return if has_clause {
                clause_end(tokens, open).unwrap_or(tokens.len())
            } else {
                i
            };
        };

        if !has_clause {
            let area = table.data_range();
            self.insert(start, i, ReferenceInfo::range(area));
            return i;
        }

        match resolve_clause(table, tokens, open, &self.anchor) {
            Some((area, end)) => {
                #[cfg(feature = "tracing")]
                if area.is_invalid() {
                    tracing::debug!(table = name, "structured reference addresses no cells");
                }
                self.insert(start, end, ReferenceInfo::range(area));
                end
            }
            None => tokens.len(),
        }
    }

    /// A clause with no table name (`[@Qty]`) refers to the table the formula
    /// sits in.
    fn resolve_anchor_clause(&mut self, open: usize) -> usize {
        let tokens = self.tokens;
        let start = self.span_start.unwrap_or(open);
        let Anchor { sheet, row, col } = self.anchor;

        let Some(table) = self.catalog.table_containing(sheet, row, col) else {
            #[cfg(feature = "tracing")]
            tracing::debug!(row, col, "table-less clause outside any table");
            return clause_end(tokens, open).unwrap_or(tokens.len());
        };

        match resolve_clause(table, tokens, open, &self.anchor) {
            Some((area, end)) => {
                self.insert(start, end, ReferenceInfo::range(area));
                end
            }
            None => tokens.len(),
        }
    }
}
