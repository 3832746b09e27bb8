//! Message rendering for Telegram. Pure functions; the client only sends.
//!
//! Messages use Telegram's legacy Markdown, so any text that comes from the
//! site or from error messages goes through [`escape_markdown`].

use std::time::Duration;

use lmstock_core::{AvailabilityRecord, Branch, StockStatus};

const PURCHASE_URL: &str = "https://logammulia.com/id/purchase/gold";

/// One purchasable entry as shown in an alert.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertItem {
    pub branch_code: String,
    pub branch_name: String,
    pub city: String,
    pub weight_grams: f64,
    pub price_minor: Option<i64>,
    pub status: StockStatus,
}

impl AlertItem {
    #[must_use]
    pub fn new(branch: &Branch, record: &AvailabilityRecord) -> Self {
        Self {
            branch_code: branch.code.clone(),
            branch_name: branch.name.clone(),
            city: branch.city.clone(),
            weight_grams: record.weight_grams,
            price_minor: record.price_minor,
            status: record.status,
        }
    }
}

/// Counts for the end-of-run summary message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub branches_checked: usize,
    pub branches_failed: usize,
    pub branches_skipped: usize,
    pub products_scanned: usize,
    pub available_count: usize,
    pub duration: Option<Duration>,
}

/// Backslash-escapes the characters legacy Markdown treats as entity markers.
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `Rp 2.4M`, `Rp 950K`, `Rp 500`; `price n/a` when the page showed none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_short_price(price_minor: Option<i64>) -> String {
    let Some(minor) = price_minor else {
        return "price n/a".to_string();
    };
    let rupiah = minor / 100;
    if rupiah >= 1_000_000 {
        format!("Rp {:.1}M", rupiah as f64 / 1_000_000.0)
    } else if rupiah >= 1_000 {
        format!("Rp {:.0}K", rupiah as f64 / 1_000.0)
    } else {
        format!("Rp {rupiah}")
    }
}

/// `1g`, `0.5g`, `100g`.
#[must_use]
pub fn format_weight(weight_grams: f64) -> String {
    if weight_grams.fract().abs() < f64::EPSILON {
        format!("{weight_grams:.0}g")
    } else {
        format!("{weight_grams}g")
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// Renders the stock alert, grouping items by branch in first-seen order.
///
/// Returns `None` for an empty item list; there is nothing to announce.
#[must_use]
pub fn format_stock_alert(items: &[AlertItem], timestamp: &str) -> Option<String> {
    if items.is_empty() {
        return None;
    }

    let mut groups: Vec<(&AlertItem, Vec<&AlertItem>)> = Vec::new();
    for item in items {
        match groups
            .iter_mut()
            .find(|(first, _)| first.branch_code == item.branch_code)
        {
            Some((_, members)) => members.push(item),
            None => groups.push((item, vec![item])),
        }
    }

    let mut message = format!(
        "🏆 *LOGAM MULIA STOCK ALERT* 🏆\n📅 {timestamp}\n\n🎯 *Available Gold Items Found:*\n"
    );
    for (i, (first, members)) in groups.iter().enumerate() {
        message.push_str(&format!(
            "\n{}. 🏪 *{}* ({})\n",
            i + 1,
            escape_markdown(&first.branch_name),
            escape_markdown(&first.city)
        ));
        for item in members {
            message.push_str(&format!(
                "   • {} - {} - {}\n",
                format_weight(item.weight_grams),
                format_short_price(item.price_minor),
                item.status
            ));
        }
    }
    message.push_str(&format!(
        "\n🔔 *Quick Actions:*\n• Visit: {PURCHASE_URL}\n• Select your preferred branch and act fast\n\n📊 Branches with stock: {}\n💰 Items available: {}\n\n#logammulia #gold #stockalert\n",
        groups.len(),
        items.len()
    ));
    Some(message)
}

#[must_use]
pub fn format_error_notification(message: &str, context: &str, timestamp: &str) -> String {
    let mut out = format!("⚠️ *LogamMulia Checker Error*\n📅 {timestamp}\n");
    if !context.is_empty() {
        out.push_str(&format!("🔧 {}\n", escape_markdown(context)));
    }
    out.push_str(&format!("\n{}\n\n#debug #error\n", escape_markdown(message)));
    out
}

/// Renders the run summary. Returns `None` when nothing was available.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_summary_report(summary: &RunSummary, timestamp: &str) -> Option<String> {
    if summary.available_count == 0 || summary.products_scanned == 0 {
        return None;
    }

    let rate = summary.available_count as f64 / summary.products_scanned as f64 * 100.0;
    let out_of_stock = summary
        .products_scanned
        .saturating_sub(summary.available_count);

    let mut out = format!("📊 *LogamMulia Stock Summary*\n📅 {timestamp}\n");
    if let Some(duration) = summary.duration {
        out.push_str(&format!("⏱️ Duration: {}\n", format_duration(duration)));
    }
    out.push_str(&format!(
        "\n📈 *Summary:*\n• Branches checked: {}\n• Branches failed: {}\n• Branches skipped: {}\n• Products scanned: {}\n• ✅ Available: {}\n• ❌ Out of stock: {}\n• 📊 Availability rate: {rate:.1}%\n\n#summary #logammulia\n",
        summary.branches_checked,
        summary.branches_failed,
        summary.branches_skipped,
        summary.products_scanned,
        summary.available_count,
        out_of_stock,
    ));
    Some(out)
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
