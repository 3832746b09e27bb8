use super::*;
use lmstock_core::{Branch, BranchKind};

fn query(weight: Option<f64>) -> StockQuery {
    StockQuery::new(
        Branch {
            code: "ASB1".to_string(),
            city: "Surabaya".to_string(),
            name: "Surabaya Darmo".to_string(),
            supports_shipping: true,
            kind: BranchKind::Regular,
        },
        weight,
    )
}

const THREE_ENTRY_PAGE: &str = r#"
<html><head><meta name="csrf-token" content="tok-123"></head>
<body>
  <select id="location"><option value="ASB1">BELM - Surabaya Darmo, Surabaya</option></select>
  <div class="product-list">
    <div class="ctr">
      <div class="item">
        <span class="title">Emas Batangan 1 gr</span>
        <input type="number" id="qty1" price="1.234.000" weight="1" value="0">
      </div>
    </div>
    <div class="ctr">
      <div class="item">
        <span class="title">Emas Batangan 5 gr</span>
        <span class="stock-label">Stok terbatas</span>
        <input type="number" id="qty5" price="5940000" weight="5" value="0">
      </div>
    </div>
    <div class="ctr">
      <div class="item">
        <span class="title">Emas Batangan 10 gr</span>
        <span class="no-stock">Belum tersedia</span>
        <input type="number" id="qty10" price="" weight="10" disabled>
      </div>
    </div>
  </div>
</body></html>
"#;

// ---------------------------------------------------------------------------
// HTML layout
// ---------------------------------------------------------------------------

#[test]
fn three_entry_page_yields_records_in_document_order() {
    let records = StockParser::default()
        .parse(THREE_ENTRY_PAGE, &query(None))
        .unwrap();

    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.branch_code == "ASB1"));

    assert!((records[0].weight_grams - 1.0).abs() < f64::EPSILON);
    assert_eq!(records[0].price_minor, Some(123_400_000));
    assert_eq!(records[0].status, StockStatus::Available);

    assert!((records[1].weight_grams - 5.0).abs() < f64::EPSILON);
    assert_eq!(records[1].price_minor, Some(594_000_000));
    assert_eq!(records[1].status, StockStatus::LimitedStock);

    assert!((records[2].weight_grams - 10.0).abs() < f64::EPSILON);
    assert_eq!(records[2].price_minor, None);
    assert_eq!(records[2].status, StockStatus::OutOfStock);
}

#[test]
fn weight_filter_keeps_only_matching_entry() {
    let records = StockParser::default()
        .parse(THREE_ENTRY_PAGE, &query(Some(5.0)))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, StockStatus::LimitedStock);
}

#[test]
fn weight_filter_with_no_match_is_empty_not_error() {
    let records = StockParser::default()
        .parse(THREE_ENTRY_PAGE, &query(Some(250.0)))
        .unwrap();
    assert!(records.is_empty());
}

#[test]
fn no_stock_marker_without_disabled_is_out_of_stock() {
    let body = r#"<div><div class="ctr"><span class="no-stock"></span>
        <input price="2000000" weight="2"></div>
        <div class="ctr"><input price="1000000" weight="1"></div></div>"#;
    let records = StockParser::default().parse(body, &query(None)).unwrap();
    assert_eq!(records[0].status, StockStatus::OutOfStock);
    assert_eq!(records[1].status, StockStatus::Available);
}

#[test]
fn limited_marker_class_is_limited() {
    let body = r#"<div class="ctr"><i class="limited-stock"></i>
        <input price="1000000" weight="1"></div>"#;
    let records = StockParser::default().parse(body, &query(None)).unwrap();
    assert_eq!(records[0].status, StockStatus::LimitedStock);
}

#[test]
fn sibling_entries_do_not_leak_status() {
    // Both inputs share one parent, so neither gets a container and the
    // "habis" text must not mark the first entry out of stock.
    let body = r#"<div class="row">
        <input price="1000000" weight="1">
        <span>Stok habis</span>
        <input price="2000000" weight="2" disabled>
    </div>"#;
    let records = StockParser::default().parse(body, &query(None)).unwrap();
    assert_eq!(records[0].status, StockStatus::Available);
    assert_eq!(records[1].status, StockStatus::OutOfStock);
}

#[test]
fn decimal_weights_are_parsed() {
    let body = r#"<div class="ctr"><input price="3850000" weight="2.5"></div>"#;
    let records = StockParser::default()
        .parse(body, &query(Some(2.5)))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!((records[0].weight_grams - 2.5).abs() < f64::EPSILON);
}

#[test]
fn sub_one_weight_attribute_is_kilograms() {
    let body = r#"<div class="list">
      <div class="ctr"><span>Emas 500 gr</span><input price="650000000" weight="0.5"></div>
      <div class="ctr"><span>Emas 1 gr</span><input price="1350000" weight="1"></div>
    </div>"#;
    let records = StockParser::default()
        .parse(body, &query(Some(500.0)))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert!((records[0].weight_grams - 500.0).abs() < f64::EPSILON);
    assert_eq!(records[0].price_minor, Some(65_000_000_000));
}

#[test]
fn unreadable_weight_fails_whole_document() {
    let body = r#"<div><div><input price="1000000" weight="1"></div>
        <div><input price="2000000" weight="dua"></div></div>"#;
    let err = StockParser::default().parse(body, &query(None)).unwrap_err();
    assert!(matches!(err, ParseError::MalformedDocument(_)));
}

#[test]
fn page_without_stock_anchors_is_unrecognized() {
    let body = "<html><body><h1>Selamat datang di Logam Mulia</h1></body></html>";
    let err = StockParser::default().parse(body, &query(None)).unwrap_err();
    assert!(matches!(err, ParseError::UnrecognizedLayout));
}

// ---------------------------------------------------------------------------
// Blocked pages
// ---------------------------------------------------------------------------

#[test]
fn challenge_page_is_blocked_not_empty() {
    let body = r#"<html><head><title>Attention Required! | Cloudflare</title></head>
        <body><script src="/cdn-cgi/challenge-platform/h/b/orchestrate"></script></body></html>"#;
    let err = StockParser::default().parse(body, &query(None)).unwrap_err();
    assert!(matches!(
        err,
        ParseError::BlockedPage(BlockKind::Challenge(_))
    ));
}

#[test]
fn empty_body_is_blocked() {
    let err = StockParser::default().parse("   ", &query(None)).unwrap_err();
    assert!(matches!(err, ParseError::BlockedPage(BlockKind::EmptyBody)));
}

#[derive(Debug)]
struct AlwaysBlocked;

impl BlockDetector for AlwaysBlocked {
    fn detect(&self, _body: &str) -> Option<BlockKind> {
        Some(BlockKind::Challenge("custom".to_string()))
    }
}

#[test]
fn custom_detector_is_used() {
    let parser = StockParser::new(Arc::new(AlwaysBlocked));
    let err = parser.parse(THREE_ENTRY_PAGE, &query(None)).unwrap_err();
    assert!(matches!(err, ParseError::BlockedPage(_)));
}

// ---------------------------------------------------------------------------
// JSON layout
// ---------------------------------------------------------------------------

#[test]
fn json_products_array() {
    let body = r#"{"products": [
        {"weight": 1, "price": 1234000, "status": "available"},
        {"weight": "5", "price": "Rp 5.940.000", "stock_status": "Stok terbatas"},
        {"weight": 10, "price": null, "available": false}
    ]}"#;
    let records = StockParser::default().parse(body, &query(None)).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].price_minor, Some(123_400_000));
    assert_eq!(records[0].status, StockStatus::Available);
    assert_eq!(records[1].price_minor, Some(594_000_000));
    assert_eq!(records[1].status, StockStatus::LimitedStock);
    assert_eq!(records[2].price_minor, None);
    assert_eq!(records[2].status, StockStatus::OutOfStock);
}

#[test]
fn json_top_level_array_with_filter() {
    let body = r#"[{"weight": 1, "price": 1000000}, {"weight": 5, "price": 5000000}]"#;
    let records = StockParser::default()
        .parse(body, &query(Some(5.0)))
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].price_minor, Some(500_000_000));
}

#[test]
fn json_empty_product_list_is_valid() {
    let records = StockParser::default()
        .parse(r#"{"items": []}"#, &query(None))
        .unwrap();
    assert!(records.is_empty());
}

#[test]
fn json_without_product_list_is_unrecognized() {
    let err = StockParser::default()
        .parse(r#"{"message": "ok"}"#, &query(None))
        .unwrap_err();
    assert!(matches!(err, ParseError::UnrecognizedLayout));
}

#[test]
fn json_truncated_is_malformed() {
    let err = StockParser::default()
        .parse(r#"{"products": [{"weight": 1"#, &query(None))
        .unwrap_err();
    assert!(matches!(err, ParseError::MalformedDocument(_)));
}

#[test]
fn json_entry_without_weight_is_malformed() {
    let err = StockParser::default()
        .parse(r#"[{"price": 1000000}]"#, &query(None))
        .unwrap_err();
    assert!(matches!(err, ParseError::MalformedDocument(_)));
}

// ---------------------------------------------------------------------------
// CSRF token and diagnostics
// ---------------------------------------------------------------------------

#[test]
fn csrf_token_from_meta() {
    assert_eq!(extract_csrf_token(THREE_ENTRY_PAGE).as_deref(), Some("tok-123"));
}

#[test]
fn csrf_token_from_hidden_input() {
    let html = r#"<form><input type="hidden" name="_token" value="abc"></form>"#;
    assert_eq!(extract_csrf_token(html).as_deref(), Some("abc"));
}

#[test]
fn csrf_token_absent() {
    assert_eq!(extract_csrf_token("<html></html>"), None);
}

#[test]
fn diagnose_counts_markers() {
    let diag = StockParser::default().diagnose(THREE_ENTRY_PAGE);
    assert_eq!(diag.layout, PageLayout::Html);
    assert_eq!(diag.block, None);
    assert_eq!(diag.priced_entries, 3);
    assert_eq!(diag.no_stock_markers, 1);
    assert_eq!(diag.limited_markers, 0);
    assert!(diag.csrf_token_present);
    assert!(diag.location_picker_present);
}
