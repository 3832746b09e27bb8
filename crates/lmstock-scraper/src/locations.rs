//! Branch discovery from the purchase page's location picker.

use lmstock_core::Branch;
use scraper::{Html, Selector};

use crate::error::ParseError;

/// Reads every `<option>` of `<select id="location">` into a [`Branch`].
///
/// Placeholder options (empty value, or a "Pilih ..." prompt) are skipped,
/// and repeated codes keep their first occurrence.
///
/// # Errors
///
/// Returns [`ParseError::UnrecognizedLayout`] if the page has no location
/// picker.
pub fn parse_location_options(html: &str) -> Result<Vec<Branch>, ParseError> {
    let document = Html::parse_document(html);
    let select = Selector::parse("select#location").map_err(|_| ParseError::UnrecognizedLayout)?;
    let option = Selector::parse("option").map_err(|_| ParseError::UnrecognizedLayout)?;

    let picker = document
        .select(&select)
        .next()
        .ok_or(ParseError::UnrecognizedLayout)?;

    let mut branches: Vec<Branch> = Vec::new();
    for opt in picker.select(&option) {
        let code = opt.value().attr("value").unwrap_or_default().trim();
        let label = opt.text().collect::<String>();
        let label = label.trim();
        if code.is_empty() || label.is_empty() || label.to_lowercase().starts_with("pilih") {
            continue;
        }
        if branches.iter().any(|b| b.code.eq_ignore_ascii_case(code)) {
            continue;
        }
        branches.push(Branch::from_location_label(code, label));
    }
    Ok(branches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmstock_core::BranchKind;

    const PICKER: &str = r#"
    <select id="location" name="location">
      <option value="">Pilih lokasi Butik Emas Logam Mulia</option>
      <option value="ASB1">BELM - Surabaya Darmo, Surabaya</option>
      <option value="AJK4">BELM - Setiabudi One (Pengambilan Di Butik), Jakarta Selatan</option>
      <option value="AEXP">Gedung Antam (Pengiriman Ekspedisi), Jakarta Timur</option>
      <option value="ASB1">BELM - Surabaya Darmo, Surabaya</option>
    </select>"#;

    #[test]
    fn parses_options_and_skips_placeholder_and_duplicates() {
        let branches = parse_location_options(PICKER).unwrap();
        let codes: Vec<&str> = branches.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes, vec!["ASB1", "AJK4", "AEXP"]);
    }

    #[test]
    fn fulfilment_kind_comes_from_label() {
        let branches = parse_location_options(PICKER).unwrap();
        assert_eq!(branches[0].kind, BranchKind::Regular);
        assert_eq!(branches[1].kind, BranchKind::PickupOnly);
        assert!(!branches[1].supports_shipping);
        assert_eq!(branches[2].kind, BranchKind::ShippingOnly);
        assert_eq!(branches[2].city, "Jakarta Timur");
    }

    #[test]
    fn missing_picker_is_unrecognized() {
        let err = parse_location_options("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, ParseError::UnrecognizedLayout));
    }
}
