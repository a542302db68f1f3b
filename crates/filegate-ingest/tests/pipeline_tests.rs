//! End-to-end checks of parse -> validate -> normalize -> payload

use filegate_ingest::{
    normalizer, parser, payload, validator, FieldValue, IngestError, NormalizedBatch,
    ProfileRegistry, SinkTarget,
};
use rust_xlsxwriter::Workbook;
use serde_json::json;
use std::collections::HashMap;

fn run(
    bytes: &[u8],
    filename: &str,
    document_type: &str,
    params: &[(&str, &str)],
) -> Result<NormalizedBatch, IngestError> {
    let registry = ProfileRegistry::builtin();
    let profile = registry.get(document_type)?;
    let params: HashMap<String, String> = params
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let context = normalizer::bind_context(profile, &params)?;
    let grid = parser::parse(bytes, filename)?;
    validator::validate(&grid, profile)?;
    normalizer::normalize(&grid, profile, &context)
}

enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

fn xlsx(header: &[&str], rows: &[Vec<Cell>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (col, name) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(r, c, *s).unwrap();
                },
                Cell::Number(n) => {
                    sheet.write_number(r, c, *n).unwrap();
                },
                Cell::Blank => {},
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

#[test]
fn test_csv_price_upload() {
    let batch = run(
        b"offer_id,price\nA1,10.5\nA2,7\n",
        "prices.csv",
        "price",
        &[("api_id", "42")],
    )
    .unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch.records[0].get("offer_id"), Some(&FieldValue::Text("A1".into())));
    assert_eq!(batch.records[1].get("price"), Some(&FieldValue::Float(7.0)));

    let registry = ProfileRegistry::builtin();
    let SinkTarget::Remote { path, shape } = &registry.get("price").unwrap().sink else {
        panic!("price uploads go to the remote API");
    };
    assert_eq!(path, "/prices");
    assert_eq!(
        payload::remote_payload(&batch, shape),
        json!({"api_id": "42", "offer_id": ["A1", "A2"], "price": [10.5, 7.0]})
    );
}

#[test]
fn test_wrong_header_is_schema_error() {
    let err = run(
        b"offer_id,cost\nA1,10.5\n",
        "prices.csv",
        "price",
        &[("api_id", "42")],
    )
    .unwrap_err();
    assert!(matches!(err, IngestError::Schema(_)));
}

#[test]
fn test_non_numeric_price_is_type_error() {
    let err = run(
        b"offer_id,price\nA1,10.5\nA2,abc\n",
        "prices.csv",
        "prices",
        &[("api_id", "42")],
    )
    .unwrap_err();
    assert!(matches!(err, IngestError::Type { ref column, .. } if column == "price"));
}

#[test]
fn test_missing_context_is_rejected_before_parsing() {
    let err = run(b"not even csv", "prices.csv", "price", &[]).unwrap_err();
    assert_eq!(err, IngestError::MissingContext("api_id".to_string()));
}

#[test]
fn test_unsupported_extension() {
    let err = run(b"offer_id,price\n", "prices.txt", "price", &[("api_id", "1")]).unwrap_err();
    assert!(matches!(err, IngestError::Parse(_)));
}

#[test]
fn test_xlsx_margin_upload() {
    let bytes = xlsx(
        &["offer_id", "margin"],
        &[
            vec![Cell::Number(1001.0), Cell::Number(0.2)],
            vec![Cell::Text("B-2"), Cell::Number(0.35)],
        ],
    );
    let batch = run(&bytes, "margin.xlsx", "min_margin", &[("api_id", "9")]).unwrap();

    assert_eq!(batch.document_type, "margin");
    assert_eq!(batch.columns, vec!["offer_id", "min_margin"]);
    assert_eq!(batch.records[0].get("offer_id"), Some(&FieldValue::Text("1001".into())));
    assert_eq!(batch.records[1].get("min_margin"), Some(&FieldValue::Float(0.35)));
}

#[test]
fn test_xlsx_sales_boost_drops_totals_row() {
    let registry = ProfileRegistry::builtin();
    let header: Vec<&str> = registry
        .get("yandex_sales_boost")
        .unwrap()
        .expected_columns()
        .unwrap()
        .iter()
        .map(String::as_str)
        .collect();

    let data_row = |sku: &'static str| -> Vec<Cell<'static>> {
        header
            .iter()
            .map(|h| match *h {
                "Начало периода" => Cell::Text("01.03.2024"),
                "Конец периода" => Cell::Text("31.03.2024"),
                "Ваш SKU" => Cell::Text(sku),
                "Продано всего, шт" => Cell::Number(12.0),
                "Расход на продвижение, рубли" => Cell::Number(150.75),
                _ => Cell::Blank,
            })
            .collect()
    };
    // Totals row: no SKU and no dates, so it would fail if kept.
    let totals: Vec<Cell> = header
        .iter()
        .map(|h| match *h {
            "Название бизнес аккаунта" => Cell::Text("Итого"),
            "Продано всего, шт" => Cell::Number(36.0),
            _ => Cell::Blank,
        })
        .collect();

    let bytes = xlsx(
        &header,
        &[data_row("S1"), data_row("S2"), data_row("S3"), totals],
    );
    let batch = run(&bytes, "boost.xlsx", "yandex_sales_boost", &[("client_id", "5")]).unwrap();

    assert_eq!(batch.len(), 3);
    let record = &batch.records[2];
    assert_eq!(record.get("sku"), Some(&FieldValue::Text("S3".into())));
    assert_eq!(record.get("total_sales_count"), Some(&FieldValue::Integer(12)));
    assert_eq!(record.get("boost_spend"), Some(&FieldValue::Float(150.75)));
    assert_eq!(record.get("client_id"), Some(&FieldValue::Integer(5)));
}

#[test]
fn test_offers_mapping_nested_payload() {
    let bytes = xlsx(
        &["ozon_offer_id", "wb_offer_id"],
        &[
            vec![Cell::Text("OZ-1"), Cell::Number(501.0)],
            vec![Cell::Text("OZ-2"), Cell::Number(502.0)],
        ],
    );
    let batch = run(&bytes, "map.xlsx", "offers_mapping_table", &[("client_id", "3")]).unwrap();

    let registry = ProfileRegistry::builtin();
    let SinkTarget::Remote { shape, .. } = &registry.get("offers_mapping_table").unwrap().sink
    else {
        panic!("mapping uploads go to the remote API");
    };
    assert_eq!(
        payload::remote_payload(&batch, shape),
        json!({
            "client_id": 3,
            "mappings": {
                "ozon_offer_id": ["OZ-1", "OZ-2"],
                "wb_offer_id": ["501", "502"]
            }
        })
    );
}

#[test]
fn test_offers_mapping_rejects_holes() {
    let bytes = xlsx(
        &["ozon_offer_id", "wb_offer_id"],
        &[
            vec![Cell::Text("OZ-1"), Cell::Number(501.0)],
            vec![Cell::Text("OZ-2"), Cell::Blank],
            vec![Cell::Text("OZ-3"), Cell::Number(503.0)],
        ],
    );
    let err = run(&bytes, "map.xlsx", "offers_mapping_table", &[("client_id", "3")]).unwrap_err();
    assert!(matches!(err, IngestError::Type { row: 3, .. }));
}
