use super::*;

fn item(code: &str, name: &str, city: &str, weight: f64, price_minor: Option<i64>) -> AlertItem {
    AlertItem {
        branch_code: code.to_string(),
        branch_name: name.to_string(),
        city: city.to_string(),
        weight_grams: weight,
        price_minor,
        status: StockStatus::Available,
    }
}

// -----------------------------------------------------------------------
// format_short_price
// -----------------------------------------------------------------------

#[test]
fn short_price_millions() {
    assert_eq!(format_short_price(Some(242_800_000)), "Rp 2.4M");
}

#[test]
fn short_price_thousands() {
    assert_eq!(format_short_price(Some(95_000_000)), "Rp 950K");
}

#[test]
fn short_price_small_and_missing() {
    assert_eq!(format_short_price(Some(50_000)), "Rp 500");
    assert_eq!(format_short_price(None), "price n/a");
}

#[test]
fn weights_drop_trailing_zero() {
    assert_eq!(format_weight(1.0), "1g");
    assert_eq!(format_weight(0.5), "0.5g");
}

#[test]
fn markdown_entities_are_escaped() {
    assert_eq!(escape_markdown("BELM_ASB1 *new*"), "BELM\\_ASB1 \\*new\\*");
    assert_eq!(escape_markdown("plain text"), "plain text");
}

// -----------------------------------------------------------------------
// format_stock_alert
// -----------------------------------------------------------------------

#[test]
fn empty_alert_is_suppressed() {
    assert_eq!(format_stock_alert(&[], "2026-10-19 08:00:00"), None);
}

#[test]
fn alert_groups_items_by_branch_in_first_seen_order() {
    let mut limited = item("ABDG", "Bandung", "Bandung", 5.0, Some(1_195_500_000));
    limited.status = StockStatus::LimitedStock;
    let items = vec![
        item("ASB1", "Surabaya Darmo", "Surabaya", 1.0, Some(242_800_000)),
        limited,
        item("ASB1", "Surabaya Darmo", "Surabaya", 2.0, Some(470_000_000)),
    ];

    let message = format_stock_alert(&items, "2026-10-19 08:00:00").unwrap();

    let darmo = message.find("1. 🏪 *Surabaya Darmo* (Surabaya)").unwrap();
    let bandung = message.find("2. 🏪 *Bandung* (Bandung)").unwrap();
    assert!(darmo < bandung);
    assert!(message.contains("   • 1g - Rp 2.4M - Available"));
    assert!(message.contains("   • 2g - Rp 4.7M - Available"));
    assert!(message.contains("   • 5g - Rp 12.0M - Limited Stock"));
    assert!(message.contains("Branches with stock: 2"));
    assert!(message.contains("Items available: 3"));
    assert!(message.contains("2026-10-19 08:00:00"));
    assert_eq!(message.matches("🏪").count(), 2);
}

#[test]
fn alert_escapes_branch_names() {
    let items = vec![item("X1", "Pulo_Gadung", "Jakarta", 1.0, None)];
    let message = format_stock_alert(&items, "ts").unwrap();
    assert!(message.contains("*Pulo\\_Gadung*"));
    assert!(message.contains("price n/a"));
}

// -----------------------------------------------------------------------
// error and summary messages
// -----------------------------------------------------------------------

#[test]
fn error_notification_includes_context_and_message() {
    let message = format_error_notification("all 5 branches failed", "check run", "ts");
    assert!(message.contains("🔧 check run"));
    assert!(message.contains("all 5 branches failed"));
    assert!(message.contains("#debug"));
}

#[test]
fn error_notification_without_context_skips_line() {
    let message = format_error_notification("boom", "", "ts");
    assert!(!message.contains("🔧"));
}

#[test]
fn summary_suppressed_when_nothing_available() {
    let summary = RunSummary {
        branches_checked: 5,
        products_scanned: 40,
        ..RunSummary::default()
    };
    assert_eq!(format_summary_report(&summary, "ts"), None);
}

#[test]
fn summary_reports_counts_and_rate() {
    let summary = RunSummary {
        branches_checked: 4,
        branches_failed: 1,
        branches_skipped: 0,
        products_scanned: 8,
        available_count: 2,
        duration: Some(Duration::from_secs(125)),
    };
    let message = format_summary_report(&summary, "ts").unwrap();
    assert!(message.contains("Duration: 2m 5s"));
    assert!(message.contains("Branches checked: 4"));
    assert!(message.contains("Branches failed: 1"));
    assert!(message.contains("✅ Available: 2"));
    assert!(message.contains("❌ Out of stock: 6"));
    assert!(message.contains("Availability rate: 25.0%"));
}
