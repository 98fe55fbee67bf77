use orders_etl::ingestion::{ingest_csv_from_path, ingest_csv_from_reader};
use orders_etl::types::{DataType, Value};
use orders_etl::ErrorKind;

#[test]
fn ingest_csv_from_path_keeps_headers_verbatim() {
    let ds = ingest_csv_from_path("tests/fixtures/orders.csv").unwrap();

    assert_eq!(ds.row_count(), 3);
    assert_eq!(
        ds.schema.field_names().collect::<Vec<_>>(),
        vec!["Order ID", "Customer ID", "Order Date", "Quantity", "Unit Price", "Status"]
    );
    assert!(ds.schema.fields.iter().all(|f| f.data_type == DataType::Utf8));
    assert_eq!(ds.rows[0][0], Value::Utf8("1001".to_string()));
}

#[test]
fn ingest_csv_does_not_trim_cells() {
    let ds = ingest_csv_from_path("tests/fixtures/customers.csv").unwrap();
    let country = ds.schema.index_of("Country").unwrap();
    assert_eq!(ds.rows[0][country], Value::Utf8(" us ".to_string()));
}

#[test]
fn ingest_csv_maps_missing_markers_to_null() {
    let input = "id,email,country\n1,,NA\n2,b@c.io,null\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let ds = ingest_csv_from_reader(&mut rdr).unwrap();
    assert_eq!(ds.row_count(), 2);
    assert_eq!(ds.rows[0][1], Value::Null);
    assert_eq!(ds.rows[0][2], Value::Null);
    assert_eq!(ds.rows[1][1], Value::Utf8("b@c.io".to_string()));
    assert_eq!(ds.rows[1][2], Value::Null);
}

#[test]
fn ingest_csv_errors_on_ragged_rows() {
    let input = "id,email\n1,a@b.io,extra\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    assert!(ingest_csv_from_reader(&mut rdr).is_err());
}

#[test]
fn ingest_csv_missing_file_is_io_error() {
    let err = ingest_csv_from_path("tests/fixtures/does_not_exist.csv").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}
