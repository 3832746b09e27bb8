//! Stock page parsing: HTML or JSON body in, availability records out.
//!
//! A document either yields a complete record list or an error. There are no
//! partial results: one entry with an unreadable weight fails the document.

use std::sync::Arc;

use lmstock_core::{AvailabilityRecord, StockQuery, StockStatus};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::detect::{BlockDetector, SignatureDetector};
use crate::error::{BlockKind, ParseError};
use crate::parse_helpers::{
    parse_price_minor, parse_weight_grams, price_minor_from_f64, status_from_text,
    unitless_weight_grams,
};

const PRICED_INPUT: &str = "input[price]";
const NO_STOCK_MARKERS: &str = ".no-stock, .out-of-stock, .stock-habis";
const LIMITED_MARKERS: &str = ".limited-stock, .stock-limited";

/// One entry before it is tied to a branch.
#[derive(Debug, Clone, PartialEq)]
struct RawEntry {
    weight_grams: f64,
    price_minor: Option<i64>,
    status: StockStatus,
}

/// Which layout a body was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    Html,
    Json,
}

/// Summary of what the parser can see in a page, for troubleshooting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDiagnostics {
    pub layout: PageLayout,
    pub block: Option<BlockKind>,
    pub priced_entries: usize,
    pub no_stock_markers: usize,
    pub limited_markers: usize,
    pub csrf_token_present: bool,
    pub location_picker_present: bool,
    pub body_bytes: usize,
}

/// Parses stock pages. Cheap to clone; the detector is shared.
#[derive(Debug, Clone)]
pub struct StockParser {
    detector: Arc<dyn BlockDetector>,
}

impl Default for StockParser {
    fn default() -> Self {
        Self::new(Arc::new(SignatureDetector::default()))
    }
}

impl StockParser {
    #[must_use]
    pub fn new(detector: Arc<dyn BlockDetector>) -> Self {
        Self { detector }
    }

    /// Runs block detection only.
    #[must_use]
    pub fn detect_block(&self, body: &str) -> Option<BlockKind> {
        self.detector.detect(body)
    }

    /// Parses `body` into records for `query`, in document order.
    ///
    /// Entries whose weight does not match `query.weight` are dropped. An
    /// empty result is valid: it means the page rendered but nothing matched.
    ///
    /// # Errors
    ///
    /// - [`ParseError::BlockedPage`] if the body is a challenge or block page.
    /// - [`ParseError::UnrecognizedLayout`] if no stock entries can be located.
    /// - [`ParseError::MalformedDocument`] if an entry is present but its
    ///   weight cannot be read, or a JSON body does not parse.
    pub fn parse(
        &self,
        body: &str,
        query: &StockQuery,
    ) -> Result<Vec<AvailabilityRecord>, ParseError> {
        if let Some(kind) = self.detect_block(body) {
            return Err(ParseError::BlockedPage(kind));
        }

        let entries = match layout_of(body) {
            PageLayout::Json => parse_json_entries(body)?,
            PageLayout::Html => parse_html_entries(body)?,
        };

        Ok(entries
            .into_iter()
            .filter(|e| query.accepts_weight(e.weight_grams))
            .map(|e| AvailabilityRecord {
                branch_code: query.branch.code.clone(),
                weight_grams: e.weight_grams,
                price_minor: e.price_minor,
                status: e.status,
            })
            .collect())
    }

    /// Counts the markers the parser relies on without failing on anything.
    #[must_use]
    pub fn diagnose(&self, body: &str) -> PageDiagnostics {
        let layout = layout_of(body);
        let block = self.detect_block(body);
        let (priced_entries, no_stock_markers, limited_markers, location_picker_present) =
            match layout {
                PageLayout::Json => {
                    let priced = parse_json_entries(body).map_or(0, |e| e.len());
                    (priced, 0, 0, false)
                }
                PageLayout::Html => {
                    let document = Html::parse_document(body);
                    (
                        count_matches(&document, PRICED_INPUT),
                        count_matches(&document, NO_STOCK_MARKERS),
                        count_matches(&document, LIMITED_MARKERS),
                        count_matches(&document, "select#location") > 0,
                    )
                }
            };

        PageDiagnostics {
            layout,
            block,
            priced_entries,
            no_stock_markers,
            limited_markers,
            csrf_token_present: extract_csrf_token(body).is_some(),
            location_picker_present,
            body_bytes: body.len(),
        }
    }
}

fn layout_of(body: &str) -> PageLayout {
    match body.trim_start().chars().next() {
        Some('{' | '[') => PageLayout::Json,
        _ => PageLayout::Html,
    }
}

fn count_matches(document: &Html, css: &str) -> usize {
    Selector::parse(css).map_or(0, |sel| document.select(&sel).count())
}

/// Reads the CSRF token from `<meta name="csrf-token">`, `<meta name="_token">`
/// or a hidden `<input name="_token">`.
#[must_use]
pub fn extract_csrf_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let candidates = [
        (r#"meta[name="csrf-token"]"#, "content"),
        (r#"meta[name="_token"]"#, "content"),
        (r#"input[name="_token"]"#, "value"),
    ];
    candidates.iter().find_map(|(css, attr)| {
        let sel = Selector::parse(css).ok()?;
        document
            .select(&sel)
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    })
}

// ---------------------------------------------------------------------------
// HTML layout
// ---------------------------------------------------------------------------

fn parse_html_entries(body: &str) -> Result<Vec<RawEntry>, ParseError> {
    let document = Html::parse_document(body);
    let priced = Selector::parse(PRICED_INPUT).map_err(|_| ParseError::UnrecognizedLayout)?;
    let no_stock = Selector::parse(NO_STOCK_MARKERS).ok();
    let limited = Selector::parse(LIMITED_MARKERS).ok();

    let inputs: Vec<ElementRef<'_>> = document.select(&priced).collect();
    if inputs.is_empty() {
        return Err(ParseError::UnrecognizedLayout);
    }

    inputs
        .into_iter()
        .map(|input| {
            let attrs = input.value();
            let raw_weight = attrs.attr("weight").unwrap_or_default();
            let weight_grams = parse_weight_grams(raw_weight).ok_or_else(|| {
                ParseError::MalformedDocument(format!(
                    "stock entry has unreadable weight {raw_weight:?}"
                ))
            })?;
            let price_minor = attrs.attr("price").and_then(parse_price_minor);

            let status = if attrs.attr("disabled").is_some() {
                StockStatus::OutOfStock
            } else {
                match entry_container(input, &priced) {
                    Some(container) => {
                        container_status(container, no_stock.as_ref(), limited.as_ref())
                    }
                    None => StockStatus::Available,
                }
            };

            Ok(RawEntry {
                weight_grams,
                price_minor,
                status,
            })
        })
        .collect()
}

/// The outermost ancestor of `input` that contains no other priced input.
fn entry_container<'a>(input: ElementRef<'a>, priced: &Selector) -> Option<ElementRef<'a>> {
    let mut container = None;
    for ancestor in input.ancestors().filter_map(ElementRef::wrap) {
        if matches!(ancestor.value().name(), "body" | "html") {
            break;
        }
        if ancestor.select(priced).count() != 1 {
            break;
        }
        container = Some(ancestor);
    }
    container
}

fn container_status(
    container: ElementRef<'_>,
    no_stock: Option<&Selector>,
    limited: Option<&Selector>,
) -> StockStatus {
    let has = |sel: Option<&Selector>| sel.is_some_and(|s| container.select(s).next().is_some());
    if has(no_stock) {
        return StockStatus::OutOfStock;
    }
    let text = container.text().collect::<Vec<_>>().join(" ");
    match status_from_text(&text) {
        StockStatus::Available if has(limited) => StockStatus::LimitedStock,
        status => status,
    }
}

// ---------------------------------------------------------------------------
// JSON layout
// ---------------------------------------------------------------------------

fn parse_json_entries(body: &str) -> Result<Vec<RawEntry>, ParseError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ParseError::MalformedDocument(format!("invalid JSON: {e}")))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("products")
            .or_else(|| map.get("items"))
            .and_then(Value::as_array)
            .ok_or(ParseError::UnrecognizedLayout)?,
        _ => return Err(ParseError::UnrecognizedLayout),
    };

    items.iter().enumerate().map(|(i, item)| json_entry(i, item)).collect()
}

fn json_entry(index: usize, item: &Value) -> Result<RawEntry, ParseError> {
    let weight_grams = match item.get("weight") {
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|w| w.is_finite() && *w > 0.0)
            .map(unitless_weight_grams),
        Some(Value::String(s)) => parse_weight_grams(s),
        _ => None,
    }
    .ok_or_else(|| {
        ParseError::MalformedDocument(format!("entry {index} has no readable weight"))
    })?;

    let price_minor = match item.get("price") {
        Some(Value::Number(n)) => n.as_f64().and_then(price_minor_from_f64),
        Some(Value::String(s)) => parse_price_minor(s),
        _ => None,
    };

    let status_text = item
        .get("status")
        .or_else(|| item.get("stock_status"))
        .and_then(Value::as_str);
    let status = match (item.get("available").and_then(Value::as_bool), status_text) {
        (Some(false), _) => StockStatus::OutOfStock,
        (_, Some(text)) => status_from_text(text),
        _ => StockStatus::Available,
    };

    Ok(RawEntry {
        weight_grams,
        price_minor,
        status,
    })
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
