//! The lookups reference resolution needs from a workbook, and an in-memory
//! workbook that provides them.

use formref_common::{
    CoordError, ExternalLinkId, FixedFlags, LiteralValue, MAX_COLUMNS, MAX_ROWS, RangeArea,
    SheetId,
};
use formref_parse::{A1Target, parse_reference};
use rustc_hash::FxHashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::CatalogError;

/// Read access to worksheet, name and table metadata, plus the external-link
/// registry (which assigns ids on first sight and therefore needs `&mut`).
///
/// Callers must not change names or tables while a formula is being resolved
/// against them.
pub trait ReferenceCatalog {
    /// Position id of the worksheet called `name`.
    fn sheet_id(&self, name: &str) -> Option<SheetId>;

    /// A name defined in the scope of worksheet `sheet`.
    fn local_name(&self, sheet: SheetId, name: &str) -> Option<&DefinedName>;

    /// A workbook-scoped name.
    fn workbook_name(&self, name: &str) -> Option<&DefinedName>;

    fn table(&self, name: &str) -> Option<&TableDefinition>;

    /// The table whose range contains the given cell, for clauses written
    /// without a table name (`[@Qty]`).
    fn table_containing(&self, _sheet: SheetId, _row: u32, _col: u32) -> Option<&TableDefinition> {
        None
    }

    /// Id of the external workbook at `path`, assigning the next free id if
    /// the path has not been seen before.
    fn external_link_id(&mut self, path: &str) -> ExternalLinkId;
}

/// Scope of a defined name
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameScope {
    /// Visible from every sheet
    Workbook,
    /// Only visible from (or explicitly qualified with) one sheet
    Sheet(SheetId),
}

/// One rectangle a defined name points at, as stored by the workbook.
///
/// `sheet` is the sheet name as written; `None` means the sheet the name
/// belongs to (or, for workbook names, the sheet of the formula using it).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedArea {
    pub external_path: Option<String>,
    pub sheet: Option<String>,
    pub from_row: u32,
    pub from_col: u32,
    pub to_row: u32,
    pub to_col: u32,
    pub fixed: FixedFlags,
}

impl NamedArea {
    /// Parse a single A1 reference such as `Sheet1!$A$1:$B$9` or
    /// `'[Book2.xlsx]Rates'!$C$3`.
    pub fn from_a1(text: &str) -> Result<Self, CoordError> {
        let reference = parse_reference(text.trim())?;
        let (external_path, sheet) = match reference.qualifier {
            Some(q) => (q.external, q.sheet),
            None => (None, None),
        };
        let (from_row, from_col, to_row, to_col, fixed) = match reference.target {
            A1Target::Cell(c) => (
                c.row,
                c.col,
                c.row,
                c.col,
                FixedFlags::from_markers(c.row_fixed, c.col_fixed, c.row_fixed, c.col_fixed),
            ),
            A1Target::Area {
                from_row,
                from_col,
                to_row,
                to_col,
                fixed,
            } => (from_row, from_col, to_row, to_col, fixed),
        };
        Ok(NamedArea {
            external_path,
            sheet,
            from_row,
            from_col,
            to_row,
            to_col,
            fixed,
        })
    }
}

/// What a defined name is bound to
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum NameDefinition {
    /// A constant (`TaxRate = 0.2`)
    Value(LiteralValue),
    /// A formula, kept as text and never relocated
    Formula(String),
    /// One or more cell rectangles
    Areas(Vec<NamedArea>),
}

impl NameDefinition {
    /// Parse a comma-separated list of A1 references into an `Areas`
    /// definition: `Sheet1!$A$1:$A$4,Sheet1!$C$1`.
    pub fn areas_from_a1(text: &str) -> Result<Self, CoordError> {
        split_top_level_commas(text)
            .into_iter()
            .map(NamedArea::from_a1)
            .collect::<Result<Vec<_>, _>>()
            .map(NameDefinition::Areas)
    }
}

fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// A defined name with its scope.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DefinedName {
    pub name: String,
    pub scope: NameScope,
    pub definition: NameDefinition,
}

impl DefinedName {
    /// The sheet the name belongs to, if it is sheet-scoped.
    pub fn owner_sheet(&self) -> Option<SheetId> {
        match self.scope {
            NameScope::Workbook => None,
            NameScope::Sheet(id) => Some(id),
        }
    }
}

/// Native table (list object) metadata.
///
/// `from_*`/`to_*` cover the whole table, header and totals rows included.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub sheet: SheetId,
    pub from_row: u32,
    pub from_col: u32,
    pub to_row: u32,
    pub to_col: u32,
    /// Column names, left to right.
    pub columns: Vec<String>,
    pub show_header: bool,
    pub show_totals: bool,
}

impl TableDefinition {
    /// A table with a header row and no totals row.
    pub fn new(
        name: impl Into<String>,
        sheet: SheetId,
        (from_row, from_col): (u32, u32),
        (to_row, to_col): (u32, u32),
        columns: Vec<String>,
    ) -> Self {
        TableDefinition {
            name: name.into(),
            sheet,
            from_row,
            from_col,
            to_row,
            to_col,
            columns,
            show_header: true,
            show_totals: false,
        }
    }

    pub fn with_header_row(mut self, show: bool) -> Self {
        self.show_header = show;
        self
    }

    pub fn with_totals_row(mut self, show: bool) -> Self {
        self.show_totals = show;
        self
    }

    /// The whole table, as an area on the table's sheet.
    pub fn address(&self) -> RangeArea {
        RangeArea::new(
            self.from_row as i32,
            self.from_col as i32,
            self.to_row as i32,
            self.to_col as i32,
            FixedFlags::empty(),
        )
        .with_sheet(Some(self.sheet))
    }

    /// The table minus its header and totals rows.
    pub fn data_range(&self) -> RangeArea {
        let mut area = self.address();
        if self.show_header {
            area.from_row += 1;
        }
        if self.show_totals {
            area.to_row -= 1;
        }
        area
    }

    pub fn header_row(&self) -> Option<u32> {
        self.show_header.then_some(self.from_row)
    }

    pub fn totals_row(&self) -> Option<u32> {
        self.show_totals.then_some(self.to_row)
    }

    /// Sheet column of the table column called `name` (case-insensitive).
    pub fn column_position(&self, name: &str) -> Option<u32> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .map(|idx| self.from_col + idx as u32)
    }

    pub fn contains(&self, sheet: SheetId, row: u32, col: u32) -> bool {
        sheet == self.sheet
            && (self.from_row..=self.to_row).contains(&row)
            && (self.from_col..=self.to_col).contains(&col)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason| CatalogError::InvalidTableRange {
            name: self.name.clone(),
            reason,
        };
        if self.from_row == 0 || self.from_col == 0 {
            return Err(invalid("rows and columns are 1-based"));
        }
        if self.from_row > self.to_row || self.from_col > self.to_col {
            return Err(invalid("start is after end"));
        }
        if self.to_row > MAX_ROWS || self.to_col > MAX_COLUMNS {
            return Err(invalid("extends past the sheet"));
        }
        let header_and_totals = self.show_header as u32 + self.show_totals as u32;
        if self.to_row - self.from_row + 1 <= header_and_totals {
            return Err(invalid("no data rows"));
        }
        if self.columns.len() as u32 != self.to_col - self.from_col + 1 {
            return Err(invalid("column names do not match the width"));
        }
        Ok(())
    }
}

/// Key normalisation for [`MemoryCatalog`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogConfig {
    /// Match defined names and sheet names exactly instead of ASCII
    /// case-insensitively.
    pub case_sensitive_names: bool,
    pub case_sensitive_tables: bool,
}

/// A self-contained workbook catalog: sheets, names, tables and external
/// links, all held in memory.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    config: CatalogConfig,
    sheet_ids: FxHashMap<String, SheetId>,
    sheet_names: Vec<String>,
    workbook_names: FxHashMap<String, DefinedName>,
    local_names: FxHashMap<(SheetId, String), DefinedName>,
    tables: FxHashMap<String, TableDefinition>,
    external_links: FxHashMap<String, ExternalLinkId>,
    link_paths: Vec<String>,
}

#[inline]
fn normalize_key(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        MemoryCatalog::default()
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        MemoryCatalog {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> CatalogConfig {
        self.config
    }

    #[inline]
    fn name_key(&self, name: &str) -> String {
        normalize_key(name, self.config.case_sensitive_names)
    }

    #[inline]
    fn table_key(&self, name: &str) -> String {
        normalize_key(name, self.config.case_sensitive_tables)
    }

    /// Register a worksheet; ids are handed out in order starting at 0.
    pub fn add_sheet(&mut self, name: &str) -> Result<SheetId, CatalogError> {
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        let key = self.name_key(name);
        if let Some(&existing) = self.sheet_ids.get(&key) {
            return Err(CatalogError::DuplicateSheet {
                name: name.to_string(),
                existing: self.sheet_names[existing as usize].clone(),
            });
        }
        let id = SheetId::try_from(self.sheet_names.len()).map_err(|_| {
            CatalogError::TooManySheets {
                max: SheetId::MAX as usize + 1,
            }
        })?;
        self.sheet_names.push(name.to_string());
        self.sheet_ids.insert(key, id);
        Ok(id)
    }

    pub fn sheet_name(&self, id: SheetId) -> Option<&str> {
        self.sheet_names.get(id as usize).map(String::as_str)
    }

    pub fn define_name(
        &mut self,
        name: &str,
        scope: NameScope,
        definition: NameDefinition,
    ) -> Result<(), CatalogError> {
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        let key = self.name_key(name);
        let entry = DefinedName {
            name: name.to_string(),
            scope,
            definition,
        };
        let duplicate = || CatalogError::DuplicateName {
            name: name.to_string(),
        };
        match scope {
            NameScope::Workbook => {
                if self.workbook_names.contains_key(&key) {
                    return Err(duplicate());
                }
                self.workbook_names.insert(key, entry);
            }
            NameScope::Sheet(sheet) => {
                if self.sheet_name(sheet).is_none() {
                    return Err(CatalogError::UnknownSheet(sheet));
                }
                let key = (sheet, key);
                if self.local_names.contains_key(&key) {
                    return Err(duplicate());
                }
                self.local_names.insert(key, entry);
            }
        }
        Ok(())
    }

    pub fn define_table(&mut self, table: TableDefinition) -> Result<(), CatalogError> {
        if table.name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if self.sheet_name(table.sheet).is_none() {
            return Err(CatalogError::UnknownSheet(table.sheet));
        }
        table.validate()?;

        let key = self.table_key(&table.name);
        if let Some(existing) = self.tables.get(&key) {
            return Err(CatalogError::DuplicateTable {
                name: table.name.clone(),
                existing: existing.name.clone(),
            });
        }
        self.tables.insert(key, table);
        Ok(())
    }

    /// Path of a previously assigned external link.
    pub fn external_link_path(&self, id: ExternalLinkId) -> Option<&str> {
        let idx = usize::from(id).checked_sub(1)?;
        self.link_paths.get(idx).map(String::as_str)
    }
}

impl ReferenceCatalog for MemoryCatalog {
    fn sheet_id(&self, name: &str) -> Option<SheetId> {
        self.sheet_ids.get(&self.name_key(name)).copied()
    }

    fn local_name(&self, sheet: SheetId, name: &str) -> Option<&DefinedName> {
        self.local_names.get(&(sheet, self.name_key(name)))
    }

    fn workbook_name(&self, name: &str) -> Option<&DefinedName> {
        self.workbook_names.get(&self.name_key(name))
    }

    fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(&self.table_key(name))
    }

    fn table_containing(&self, sheet: SheetId, row: u32, col: u32) -> Option<&TableDefinition> {
        self.tables.values().find(|t| t.contains(sheet, row, col))
    }

    fn external_link_id(&mut self, path: &str) -> ExternalLinkId {
        if let Some(&id) = self.external_links.get(path) {
            return id;
        }
        // Ids start at 1; 0 is never a link.
        let id = ExternalLinkId::try_from(self.link_paths.len() + 1).unwrap_or(ExternalLinkId::MAX);
        self.link_paths.push(path.to_string());
        self.external_links.insert(path.to_string(), id);
        id
    }
}
