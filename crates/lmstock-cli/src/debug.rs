//! The `debug` command: fetch one branch and show what the parser makes of it.

use std::path::Path;

use lmstock_core::{AppConfig, StockQuery};

pub(crate) async fn run_debug(
    config: &AppConfig,
    branch_code: &str,
    weight: Option<f64>,
    save: Option<&Path>,
) -> anyhow::Result<()> {
    let registry = crate::load_registry(config)?;
    let branch = registry
        .get(branch_code)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("unknown branch code '{branch_code}'"))?;

    let client = crate::build_stock_client(config)?;
    let query = StockQuery::new(branch, weight);
    let body = client.fetch_stock_page(&query).await?;

    if let Some(path) = save {
        std::fs::write(path, &body)
            .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
        println!("saved {} bytes to {}", body.len(), path.display());
    }

    let parser = client.parser();
    let diagnostics = parser.diagnose(&body);
    println!(
        "branch {} ({}, {})",
        query.branch.code, query.branch.name, query.branch.city
    );
    println!("  layout:            {:?}", diagnostics.layout);
    println!("  body bytes:        {}", diagnostics.body_bytes);
    match &diagnostics.block {
        Some(kind) => println!("  block detected:    {kind}"),
        None => println!("  block detected:    none"),
    }
    println!("  priced entries:    {}", diagnostics.priced_entries);
    println!("  no-stock markers:  {}", diagnostics.no_stock_markers);
    println!("  limited markers:   {}", diagnostics.limited_markers);
    println!("  csrf token:        {}", diagnostics.csrf_token_present);
    println!("  location picker:   {}", diagnostics.location_picker_present);

    match parser.parse(&body, &query) {
        Ok(records) => {
            println!("  parsed records:    {}", records.len());
            for record in records {
                let price = record
                    .price_idr()
                    .map_or_else(|| "n/a".to_string(), |p| format!("Rp {p}"));
                println!(
                    "    {}g  {price}  {}",
                    record.weight_grams, record.status
                );
            }
        }
        Err(e) => println!("  parse error:       {e}"),
    }
    Ok(())
}
