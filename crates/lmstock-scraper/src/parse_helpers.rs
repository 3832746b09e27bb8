//! Value-level parsing shared by the HTML and JSON stock layouts.
//!
//! Indonesian pages mix `.` and `,` as thousands and decimal separators
//! ("Rp 1.234.000", "1.234.000,00", "1,5 gr"), so separators are resolved by
//! position rather than by locale.

use lmstock_core::StockStatus;

/// Phrases meaning the entry cannot be bought. Checked before the
/// limited/available phrases because "unavailable" contains "available".
const OUT_OF_STOCK_PHRASES: [&str; 8] = [
    "belum tersedia",
    "tidak tersedia",
    "habis",
    "kosong",
    "out of stock",
    "out_of_stock",
    "sold out",
    "unavailable",
];

const LIMITED_PHRASES: [&str; 3] = ["terbatas", "limited", "sisa sedikit"];

/// Parses a rupiah amount into sen.
///
/// Accepts an optional `Rp`/`IDR` prefix, whitespace, a trailing `,-`, and
/// either separator convention. A final separator followed by one or two
/// digits is the decimal point; all other separators group thousands.
///
/// Returns `None` for empty, non-numeric, or overflowing input.
pub(crate) fn parse_price_minor(raw: &str) -> Option<i64> {
    let lowered = raw.trim().to_ascii_lowercase();
    let unprefixed = lowered
        .strip_prefix("rp")
        .or_else(|| lowered.strip_prefix("idr"))
        .unwrap_or(&lowered);
    let compact: String = unprefixed
        .trim_end_matches(",-")
        .trim_end_matches(".-")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if compact.is_empty()
        || !compact
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return None;
    }

    let (int_part, frac_part) = match compact.rfind(['.', ',']) {
        Some(pos) if (1..=2).contains(&(compact.len() - pos - 1)) => {
            (&compact[..pos], &compact[pos + 1..])
        }
        _ => (compact.as_str(), ""),
    };

    let int_digits: String = int_part.chars().filter(char::is_ascii_digit).collect();
    if int_digits.is_empty() && frac_part.is_empty() {
        return None;
    }
    let whole: i64 = if int_digits.is_empty() {
        0
    } else {
        int_digits.parse().ok()?
    };
    let sen: i64 = match frac_part.len() {
        0 => 0,
        1 => frac_part.parse::<i64>().ok()? * 10,
        _ => frac_part.parse().ok()?,
    };

    whole.checked_mul(100)?.checked_add(sen)
}

/// Converts a JSON number of rupiah into sen.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn price_minor_from_f64(rupiah: f64) -> Option<i64> {
    if !rupiah.is_finite() || rupiah < 0.0 {
        return None;
    }
    let sen = (rupiah * 100.0).round();
    // i64::MAX as f64 rounds up, so compare strictly.
    #[allow(clippy::cast_precision_loss)]
    let limit = i64::MAX as f64;
    (sen < limit).then_some(sen as i64)
}

/// Parses a bar weight into grams.
///
/// Values with a gram suffix (`"5 gr"`, `"5g"`, `"100 gram"`) are grams and a
/// `"kg"` suffix is kilograms. The site's bare `weight` attribute is grams
/// from 1 upward and kilograms below 1, so a unitless `"0.5"` is 500 g.
/// Accepts a comma decimal separator. Rejects zero, negative, and non-finite
/// values.
pub(crate) fn parse_weight_grams(raw: &str) -> Option<f64> {
    let lowered = raw.trim().to_lowercase();
    if let Some(kilos) = lowered.strip_suffix("kg") {
        return parse_positive(kilos).map(|kg| kg * 1000.0);
    }
    let numeric = lowered
        .trim_end_matches('s')
        .trim_end_matches("gram")
        .trim_end_matches("gr")
        .trim_end_matches('g');
    let weight = parse_positive(numeric)?;
    if numeric.len() == lowered.len() {
        Some(unitless_weight_grams(weight))
    } else {
        Some(weight)
    }
}

/// Grams for a bare weight value: below 1 it is a kilogram figure.
pub(crate) fn unitless_weight_grams(weight: f64) -> f64 {
    if weight < 1.0 {
        weight * 1000.0
    } else {
        weight
    }
}

fn parse_positive(numeric: &str) -> Option<f64> {
    let value: f64 = numeric.trim().replace(',', ".").parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Maps free text (status labels, or an entry's surrounding text) to a status.
pub(crate) fn status_from_text(text: &str) -> StockStatus {
    let lowered = text.to_lowercase();
    if OUT_OF_STOCK_PHRASES.iter().any(|p| lowered.contains(p)) {
        StockStatus::OutOfStock
    } else if LIMITED_PHRASES.iter().any(|p| lowered.contains(p)) {
        StockStatus::LimitedStock
    } else {
        StockStatus::Available
    }
}
