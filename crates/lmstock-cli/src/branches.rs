//! The `branches` command: list the registry or import it from the site's
//! location picker.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use lmstock_core::{AppConfig, Branch, BranchKind, BranchRegistry, BranchesFile};

#[derive(Debug, Subcommand)]
pub(crate) enum BranchesCommands {
    /// Print the branches the checker knows about, grouped by city
    List {
        /// Only branches that ship by courier
        #[arg(long)]
        shipping_only: bool,
    },
    /// Rebuild the branch file from the location picker
    Import {
        /// Read a saved change-location page instead of fetching the live one
        #[arg(long)]
        from_html: Option<PathBuf>,

        /// YAML file to write
        #[arg(long, default_value = "config/branches.yaml")]
        output: PathBuf,
    },
}

pub(crate) async fn run_branches_command(
    config: &AppConfig,
    command: BranchesCommands,
) -> anyhow::Result<()> {
    match command {
        BranchesCommands::List { shipping_only } => {
            let registry = crate::load_registry(config)?;
            print!("{}", render_listing(&registry, shipping_only));
            Ok(())
        }
        BranchesCommands::Import { from_html, output } => {
            let branches = match from_html {
                Some(path) => {
                    let html = std::fs::read_to_string(&path).map_err(|e| {
                        anyhow::anyhow!("failed to read {}: {e}", path.display())
                    })?;
                    lmstock_scraper::parse_location_options(&html)?
                }
                None => crate::build_stock_client(config)?.discover_branches().await?,
            };
            let count = write_branches_file(branches, &output)?;
            println!("imported {count} branches into {}", output.display());
            Ok(())
        }
    }
}

fn kind_label(branch: &Branch) -> &'static str {
    match branch.kind {
        BranchKind::Regular => "",
        BranchKind::PickupOnly => " [pickup only]",
        BranchKind::ShippingOnly => " [shipping only]",
    }
}

pub(crate) fn render_listing(registry: &BranchRegistry, shipping_only: bool) -> String {
    let mut out = String::new();
    let mut shown = 0usize;
    for (city, branches) in registry.by_city() {
        let branches: Vec<&Branch> = branches
            .into_iter()
            .filter(|b| !shipping_only || b.supports_shipping)
            .collect();
        if branches.is_empty() {
            continue;
        }
        out.push_str(city);
        out.push('\n');
        for branch in branches {
            out.push_str(&format!("  {:<6} {}{}\n", branch.code, branch.name, kind_label(branch)));
            shown += 1;
        }
    }
    out.push_str(&format!("{shown} branches\n"));
    out
}

/// Validates `branches` as a registry and writes them as YAML.
///
/// Returns the number of branches written.
pub(crate) fn write_branches_file(branches: Vec<Branch>, path: &Path) -> anyhow::Result<usize> {
    let registry = BranchRegistry::new(branches)?;
    if registry.is_empty() {
        anyhow::bail!("location picker listed no branches; refusing to write an empty registry");
    }

    let file = BranchesFile {
        branches: registry.all().to_vec(),
    };
    let yaml = serde_yaml::to_string(&file)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", parent.display()))?;
    }
    std::fs::write(path, yaml)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    Ok(registry.len())
}
