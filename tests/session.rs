use anyhow::Result;
use pretty_assertions::assert_eq;
use sheet_dataset::ColumnSchema;
use sheet_dataset::ColumnType;
use sheet_dataset::Session;
use sheet_dataset::SheetDatasetError;
use sheet_dataset::Spreadsheet;
use sheet_dataset::Value;
use sheet_dataset::XlsxSpreadsheet;
use std::path::Path;
use std::path::PathBuf;
use tempfile::TempDir;

fn create_orders(dir: &TempDir) -> Result<PathBuf> {
    let path = dir.path().join("orders.xlsx");
    let mut workbook = XlsxSpreadsheet::new();
    let sheet = workbook.create_sheet();
    sheet.set_name("Orders");
    let rows = [
        ["Name", "Qty", "Price", "Paid", "Ordered"],
        ["Widget", "10", "2.5", "TRUE", "2024-01-15 10:30:00"],
        ["Gadget", "5", "12", "false", "2024-02-01"],
    ];
    for (row, values) in rows.iter().enumerate() {
        for (col, value) in values.iter().enumerate() {
            sheet.write_cell(row + 1, col + 1, value);
        }
    }
    workbook.create_sheet().set_name("Notes");
    workbook.save_as(&path)?;
    Ok(path)
}

fn values(session: &Session, table: &str, column: &str) -> Vec<Value> {
    let table = session.store().get(table).expect("table");
    (0..table.len())
        .filter_map(|row| table.value(row, column).cloned())
        .collect()
}

#[test]
fn read_typed_table_from_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = create_orders(&dir)?;
    let schema: ColumnSchema = "Name=A:string, Qty=B:int, Price=C:double, Paid=D:bool, Ordered=E:datetime".parse()?;

    let mut session: Session = Session::open(&path)?;
    assert!(session.read_sheet("Orders", 2, &schema)?);

    assert_eq!(values(&session, "Orders", "Name"), vec![
        Value::String("Widget".to_owned()),
        Value::String("Gadget".to_owned()),
    ]);
    assert_eq!(values(&session, "Orders", "Qty"), vec![Value::Int32(10), Value::Int32(5)]);
    assert_eq!(values(&session, "Orders", "Price"), vec![Value::Float64(2.5), Value::Float64(12.0)]);
    assert_eq!(values(&session, "Orders", "Paid"), vec![Value::Boolean(true), Value::Boolean(false)]);
    let ordered: Vec<String> = values(&session, "Orders", "Ordered").iter().map(Value::to_string).collect();
    assert_eq!(ordered, vec!["2024-01-15 10:30:00", "2024-02-01 00:00:00"]);
    Ok(())
}

#[test]
fn write_table_and_save() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = create_orders(&dir)?;
    let schema = ColumnSchema::builder()
        .column("Name", "A", ColumnType::String)
        .column("Qty", "B", ColumnType::Int32)
        .build()?;

    let mut session: Session = Session::open(&path)?;
    session.read_sheet("Orders", 2, &schema)?;
    assert!(session.copy_table("Orders", "Archive"));
    assert!(session.write_table("Archive")?);
    assert!(!session.write_table("Orders")?);
    assert!(session.close_workbook(true)?);

    let workbook = XlsxSpreadsheet::open(&path)?;
    assert_eq!(workbook.sheet_names(), vec!["Orders", "Notes", "Archive"]);
    let archive = workbook.sheet("Archive").expect("archive sheet");
    let cells: Vec<String> = archive.cells().map(|cell| cell.to_string()).collect();
    assert_eq!(cells, vec!["Widget", "10", "Gadget", "5"]);
    assert_eq!(archive.dimensions(), Some((2, 2)));
    Ok(())
}

#[test]
fn dropping_a_session_does_not_save() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = create_orders(&dir)?;
    let schema: ColumnSchema = "Name=A:string".parse()?;

    {
        let mut session: Session = Session::open(&path)?;
        session.read_sheet("Orders", 2, &schema)?;
        session.rename_table("Orders", "Unsaved");
        assert!(session.write_table("Unsaved")?);
    }

    let workbook = XlsxSpreadsheet::open(&path)?;
    assert_eq!(workbook.sheet_names(), vec!["Orders", "Notes"]);
    Ok(())
}

#[test]
fn reopen_after_close() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = create_orders(&dir)?;
    let schema: ColumnSchema = "Name=A:string".parse()?;

    let mut session: Session = Session::new();
    assert!(session.open_workbook(&path)?);
    assert!(!session.open_workbook(&path)?);
    session.read_sheet("Orders", 2, &schema)?;
    assert!(session.close_workbook(false)?);
    assert!(session.open_workbook(&path)?);

    assert!(session.read_sheet("Orders", 2, &schema)?);
    assert_eq!(session.store().len(), 1);
    assert_eq!(session.into_store().names(), vec!["Orders"]);
    Ok(())
}

#[test]
fn open_failures() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing.xlsx");
    assert!(matches!(Session::<XlsxSpreadsheet>::open(&missing), Err(SheetDatasetError::IoError(_))));

    let text = dir.path().join("orders.csv");
    std::fs::write(&text, "Name,Qty\nWidget,10\n")?;
    assert!(Session::<XlsxSpreadsheet>::open(&text).is_err());

    let fake = dir.path().join("fake.xlsx");
    std::fs::write(&fake, "not a workbook")?;
    assert!(matches!(XlsxSpreadsheet::open(&fake), Err(SheetDatasetError::ZipError(_))));

    assert!(XlsxSpreadsheet::new().save().is_err());
    assert!(XlsxSpreadsheet::open(Path::new("")).is_err());
    Ok(())
}
