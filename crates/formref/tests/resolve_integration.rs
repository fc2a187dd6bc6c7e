use formref::formref_common::MAX_ROWS;
use formref::{
    Anchor, CellAddress, FixedFlags, Formula, LiteralValue, MemoryCatalog, NameDefinition,
    NameScope, RangeArea, ReferenceInfo, TableDefinition,
};

// Sheet1 (id 0) holds Table1 at A1:C5 with a header row, and Sales at F10:H20
// with header and totals rows. Sheet2 has id 1.
fn workbook() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog.add_sheet("Sheet1").unwrap();
    catalog.add_sheet("Sheet2").unwrap();
    catalog
        .define_table(TableDefinition::new(
            "Table1",
            0,
            (1, 1),
            (5, 3),
            vec!["Column1".into(), "Column2".into(), "Column3".into()],
        ))
        .unwrap();
    catalog
        .define_table(
            TableDefinition::new(
                "Sales",
                0,
                (10, 6),
                (20, 8),
                vec!["Region".into(), "Qty".into(), "Price".into()],
            )
            .with_totals_row(true),
        )
        .unwrap();
    catalog
}

const ANCHOR: Anchor = Anchor::new(0, 30, 10);

fn single_area(info: &ReferenceInfo) -> RangeArea {
    match info.areas() {
        [area] => *area,
        other => panic!("expected one area, got {other:?}"),
    }
}

fn bounds(area: RangeArea) -> (i32, i32, i32, i32) {
    (area.from_row, area.from_col, area.to_row, area.to_col)
}

#[test]
fn integration_relative_cells() {
    let mut catalog = workbook();
    let formula = Formula::parse("A1+B2", ANCHOR, &mut catalog);
    let refs: Vec<_> = formula.references().collect();
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].span(), 0..=0);
    assert_eq!(refs[1].span(), 2..=2);
    assert_eq!(
        refs[1].info,
        ReferenceInfo::CellAddress(CellAddress {
            external: None,
            sheet: Some(0),
            row: 2,
            col: 2,
            row_fixed: false,
            col_fixed: false,
        })
    );
    assert!(!formula.is_fixed());
}

#[test]
fn integration_no_references_in_arithmetic() {
    let mut catalog = workbook();
    for text in ["-1", "1-2", "=\"A1\"&TRUE"] {
        let formula = Formula::parse(text, ANCHOR, &mut catalog);
        assert_eq!(formula.references().count(), 0, "{text}");
        assert!(formula.is_fixed());
    }
}

#[test]
fn integration_absolute_cell_never_moves() {
    let mut catalog = workbook();
    let mut formula = Formula::parse("$A$1", ANCHOR, &mut catalog);
    let before = formula.references().cloned().collect::<Vec<_>>();
    formula.apply_offset(5, 5);
    let after = formula.references().cloned().collect::<Vec<_>>();
    assert_eq!(before, after);
    assert!(formula.is_fixed());
}

#[test]
fn integration_sheet_qualified_and_unknown_sheets() {
    let mut catalog = workbook();
    let formula = Formula::parse("Sheet2!C3+Nope!C3+'Sheet2'!D4", ANCHOR, &mut catalog);
    let cells: Vec<_> = formula
        .references()
        .map(|r| r.info.as_cell().copied().unwrap())
        .collect();
    assert_eq!(cells[0].sheet, Some(1));
    assert_eq!(cells[1].sheet, None);
    assert_eq!(cells[2].sheet, Some(1));
    assert_eq!((cells[2].row, cells[2].col), (4, 4));
}

#[test]
fn integration_whole_column_range() {
    let mut catalog = workbook();
    let formula = Formula::parse("SUM(A:B)", ANCHOR, &mut catalog);
    let reference = formula.reference_at(2).unwrap();
    let area = single_area(&reference.info);
    assert_eq!(bounds(area), (1, 1, MAX_ROWS as i32, 2));
    assert_eq!(area.fixed, FixedFlags::FROM_ROW | FixedFlags::TO_ROW);
    assert_eq!(area.sheet, Some(0));
}

#[test]
fn integration_external_address_gets_a_link_id() {
    let mut catalog = workbook();
    let formula = Formula::parse("[1]Sheet1!A1+[2]Sheet1!A1+[1]Sheet1!B1", ANCHOR, &mut catalog);
    let links: Vec<_> = formula
        .references()
        .map(|r| r.info.as_cell().unwrap().external)
        .collect();
    assert_eq!(links, vec![Some(1), Some(2), Some(1)]);
    assert_eq!(catalog.external_link_path(2), Some("2"));
    assert!(formula.references().all(|r| r.info.as_cell().unwrap().sheet.is_none()));
}

#[test]
fn integration_totals_part() {
    let mut catalog = workbook();
    // SUM ( Sales [ #Totals ] )
    let formula = Formula::parse("SUM(Sales[#Totals])", ANCHOR, &mut catalog);
    let reference = formula.reference_at(2).unwrap();
    assert_eq!(reference.span(), 2..=5);
    assert_eq!(bounds(single_area(&reference.info)), (20, 6, 20, 8));

    let mut formula = Formula::parse("SUM(Table1[#Totals])", ANCHOR, &mut catalog);
    let area = single_area(&formula.reference_at(2).unwrap().info);
    assert!(area.is_invalid());

    formula.apply_offset(3, 1);
    assert_eq!(single_area(&formula.reference_at(2).unwrap().info), area);
}

#[test]
fn integration_clause_is_one_reference() {
    let mut catalog = workbook();
    let formula = Formula::parse("Table1[[#Data],[Column1]]", ANCHOR, &mut catalog);
    let refs: Vec<_> = formula.references().collect();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].span(), 0..=formula.tokens().len() - 1);
    let area = single_area(&refs[0].info);
    assert_eq!(bounds(area), (2, 1, 5, 1));
    assert!(area.fixed.is_all());
    assert!(formula.is_fixed());
}

#[test]
fn integration_column_range_clause() {
    let mut catalog = workbook();
    let formula = Formula::parse("Table1[[Column1]:[Column3]]", ANCHOR, &mut catalog);
    let area = single_area(&formula.reference_at(0).unwrap().info);
    assert_eq!(bounds(area), (2, 1, 5, 3));
}

#[test]
fn integration_this_row_follows_the_formula() {
    let mut catalog = workbook();
    let mut formula = Formula::parse("Sales[@Qty]*2", Anchor::new(0, 12, 9), &mut catalog);
    let area = single_area(&formula.reference_at(0).unwrap().info);
    assert_eq!(bounds(area), (12, 7, 12, 7));
    assert_eq!(area.fixed, FixedFlags::FROM_COL | FixedFlags::TO_COL);
    assert!(!formula.is_fixed());

    formula.apply_offset(3, 3);
    let area = single_area(&formula.reference_at(0).unwrap().info);
    assert_eq!(bounds(area), (15, 7, 15, 7));
}

#[test]
fn integration_clause_without_table_uses_the_anchor_table() {
    let mut catalog = workbook();
    // [ @ Price ] * 2
    let formula = Formula::parse("[@Price]*2", Anchor::new(0, 14, 8), &mut catalog);
    let reference = formula.reference_at(0).unwrap();
    assert_eq!(reference.span(), 0..=3);
    assert_eq!(bounds(single_area(&reference.info)), (14, 8, 14, 8));

    let outside = Formula::parse("[@Price]*2", ANCHOR, &mut catalog);
    assert_eq!(outside.references().count(), 0);
}

#[test]
fn integration_unknown_table_is_skipped() {
    let mut catalog = workbook();
    let formula = Formula::parse("Nope[Qty]+A1", ANCHOR, &mut catalog);
    let refs: Vec<_> = formula.references().collect();
    assert_eq!(refs.len(), 1);
    assert!(refs[0].info.as_cell().is_some());
}

#[test]
fn integration_defined_names() {
    let mut catalog = workbook();
    catalog
        .define_name(
            "Rate",
            NameScope::Workbook,
            NameDefinition::Value(LiteralValue::Number(0.25)),
        )
        .unwrap();
    catalog
        .define_name(
            "Double",
            NameScope::Workbook,
            NameDefinition::Formula("A1*2".into()),
        )
        .unwrap();
    catalog
        .define_name(
            "Inputs",
            NameScope::Workbook,
            NameDefinition::areas_from_a1("Sheet2!$A$1:$A$4,$C$1").unwrap(),
        )
        .unwrap();

    let formula = Formula::parse("Rate*Double+SUM(Inputs)", ANCHOR, &mut catalog);
    assert_eq!(
        formula.reference_at(0).unwrap().info,
        ReferenceInfo::FixedValue(LiteralValue::Number(0.25))
    );
    assert_eq!(
        formula.reference_at(2).unwrap().info,
        ReferenceInfo::NamedFormula("A1*2".into())
    );
    let areas = formula.reference_at(6).unwrap().info.areas().to_vec();
    assert_eq!(areas.len(), 2);
    assert_eq!(areas[0].sheet, Some(1));
    assert_eq!(bounds(areas[0]), (1, 1, 4, 1));
    // Unqualified areas of a workbook name land on the formula's sheet.
    assert_eq!(areas[1].sheet, Some(0));
    assert!(areas.iter().all(RangeArea::is_fully_fixed));
    // The named formula keeps the formula from being fixed.
    assert!(!formula.is_fixed());
}

#[test]
fn integration_sheet_scoped_names() {
    let mut catalog = workbook();
    catalog
        .define_name("Rate", NameScope::Workbook, NameDefinition::Value(LiteralValue::Int(1)))
        .unwrap();
    catalog
        .define_name("Rate", NameScope::Sheet(1), NameDefinition::Value(LiteralValue::Int(2)))
        .unwrap();
    catalog
        .define_name(
            "Here",
            NameScope::Sheet(1),
            NameDefinition::areas_from_a1("$B$2").unwrap(),
        )
        .unwrap();

    let value_at = |formula: &Formula, start| formula.reference_at(start).map(|r| r.info.clone());

    let on_sheet1 = Formula::parse("Rate", Anchor::new(0, 1, 1), &mut catalog);
    assert_eq!(value_at(&on_sheet1, 0), Some(ReferenceInfo::FixedValue(LiteralValue::Int(1))));

    let on_sheet2 = Formula::parse("Rate", Anchor::new(1, 1, 1), &mut catalog);
    assert_eq!(value_at(&on_sheet2, 0), Some(ReferenceInfo::FixedValue(LiteralValue::Int(2))));

    // Sheet2 Rate
    let qualified = Formula::parse("Sheet2!Rate", Anchor::new(0, 1, 1), &mut catalog);
    let reference = qualified.reference_at(0).unwrap();
    assert_eq!(reference.span(), 0..=1);
    assert_eq!(reference.info, ReferenceInfo::FixedValue(LiteralValue::Int(2)));

    // A qualified lookup only sees that sheet's own names.
    let missing = Formula::parse("Sheet1!Rate", Anchor::new(0, 1, 1), &mut catalog);
    assert_eq!(missing.references().count(), 0);

    // Local areas without a sheet belong to the owning sheet.
    let here = Formula::parse("Sheet2!Here", Anchor::new(0, 1, 1), &mut catalog);
    assert_eq!(single_area(&here.reference_at(0).unwrap().info).sheet, Some(1));
}

#[test]
fn integration_external_names_stay_unresolved() {
    let mut catalog = workbook();
    catalog
        .define_name("Rate", NameScope::Workbook, NameDefinition::Value(LiteralValue::Int(1)))
        .unwrap();
    let formula = Formula::parse("[1]Sheet1!Rate+[1]!Rate", ANCHOR, &mut catalog);
    assert_eq!(formula.references().count(), 0);
}

#[test]
fn integration_table_name_as_plain_name() {
    let mut catalog = workbook();
    let mut formula = Formula::parse("SUM(Sales)", ANCHOR, &mut catalog);
    let area = single_area(&formula.reference_at(2).unwrap().info);
    assert_eq!(bounds(area), (11, 6, 19, 8));
    assert!(area.fixed.is_all());

    formula.apply_offset(4, 4);
    assert_eq!(bounds(single_area(&formula.reference_at(2).unwrap().info)), (11, 6, 19, 8));
}

#[test]
fn integration_unknown_name_is_absent() {
    let mut catalog = workbook();
    let formula = Formula::parse("Missing+1", ANCHOR, &mut catalog);
    assert!(formula.reference_at(0).is_none());
    assert!(formula.is_fixed());
}
