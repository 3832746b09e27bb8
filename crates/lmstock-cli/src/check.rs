//! The `check` command: select branches, fetch them with bounded concurrency,
//! then export and notify.
//!
//! A branch that fails is recorded and the run continues. Only a run in which
//! no branch succeeded is an error.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local};
use clap::Args;
use futures::stream::{self, StreamExt};
use lmstock_core::branches::{MAJOR_BRANCH_CODES, PRIORITY_CITIES};
use lmstock_core::{AppConfig, AvailabilityRecord, Branch, BranchRegistry, ExportFormat, StockQuery};
use lmstock_notify::{AlertItem, Notifier, RunSummary};
use lmstock_scraper::{StockClient, StockError};

use crate::export::write_exports;
use crate::notify::build_notifier;

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    /// Only report bars of this weight in grams
    #[arg(long)]
    pub weight: Option<f64>,

    /// Branch codes to check, comma separated
    #[arg(long, value_delimiter = ',')]
    pub branches: Vec<String>,

    /// Upper bound on branches when picking them automatically
    #[arg(long, default_value_t = 5)]
    pub max_branches: usize,

    /// Only check branches that ship by courier
    #[arg(long)]
    pub shipping_only: bool,

    /// Do not send Telegram messages for this run
    #[arg(long)]
    pub no_notify: bool,

    /// Export formats for this run, overriding LMSTOCK_EXPORT_FORMATS
    #[arg(long, value_delimiter = ',')]
    pub export: Option<Vec<ExportFormat>>,
}

/// Where a run gets stock records from.
pub(crate) trait StockSource {
    fn check(
        &self,
        query: &StockQuery,
    ) -> impl Future<Output = Result<Vec<AvailabilityRecord>, StockError>>;
}

impl StockSource for StockClient {
    fn check(
        &self,
        query: &StockQuery,
    ) -> impl Future<Output = Result<Vec<AvailabilityRecord>, StockError>> {
        StockClient::check(self, query)
    }
}

#[derive(Debug)]
pub(crate) enum BranchOutcome {
    Checked {
        branch: Branch,
        records: Vec<AvailabilityRecord>,
    },
    Failed {
        branch: Branch,
        error: StockError,
    },
    /// The run deadline passed before this branch was started.
    Skipped { branch: Branch, reason: String },
}

impl BranchOutcome {
    pub(crate) fn branch(&self) -> &Branch {
        match self {
            BranchOutcome::Checked { branch, .. }
            | BranchOutcome::Failed { branch, .. }
            | BranchOutcome::Skipped { branch, .. } => branch,
        }
    }
}

#[derive(Debug)]
pub(crate) struct RunReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub outcomes: Vec<BranchOutcome>,
}

impl RunReport {
    /// Every record from every checked branch, paired with its branch.
    pub(crate) fn records(&self) -> impl Iterator<Item = (&Branch, &AvailabilityRecord)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                BranchOutcome::Checked { branch, records } => Some((branch, records)),
                _ => None,
            })
            .flat_map(|(branch, records)| records.iter().map(move |r| (branch, r)))
    }

    /// Records worth alerting on: Available or LimitedStock.
    pub(crate) fn alert_items(&self) -> Vec<AlertItem> {
        self.records()
            .filter(|(_, record)| record.status.is_purchasable())
            .map(|(branch, record)| AlertItem::new(branch, record))
            .collect()
    }

    pub(crate) fn failures(&self) -> impl Iterator<Item = (&Branch, &StockError)> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            BranchOutcome::Failed { branch, error } => Some((branch, error)),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&BranchOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|&o| pred(o)).count()
    }

    pub(crate) fn checked_count(&self) -> usize {
        self.count(|o| matches!(o, BranchOutcome::Checked { .. }))
    }

    pub(crate) fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, BranchOutcome::Failed { .. }))
    }

    pub(crate) fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, BranchOutcome::Skipped { .. }))
    }

    /// No branch produced a result.
    pub(crate) fn all_failed(&self) -> bool {
        !self.outcomes.is_empty() && self.checked_count() == 0
    }

    pub(crate) fn summary(&self) -> RunSummary {
        let products_scanned = self.records().count();
        let available_count = self
            .records()
            .filter(|(_, r)| r.status.is_purchasable())
            .count();
        RunSummary {
            branches_checked: self.checked_count(),
            branches_failed: self.failed_count(),
            branches_skipped: self.skipped_count(),
            products_scanned,
            available_count,
            duration: (self.finished_at - self.started_at).to_std().ok(),
        }
    }
}

/// Which branches a run covers.
#[derive(Debug, Clone, Default)]
pub(crate) struct Selection {
    pub codes: Vec<String>,
    pub max_branches: usize,
    pub shipping_only: bool,
    pub weight: Option<f64>,
}

/// Picks branches for a run.
///
/// Explicit codes win. Otherwise shipping-only and weight searches take the
/// first `max_branches` of the registry with priority cities first, and a
/// plain run checks the major boutiques.
pub(crate) fn select_branches(
    registry: &BranchRegistry,
    selection: &Selection,
) -> anyhow::Result<Vec<Branch>> {
    if !selection.codes.is_empty() {
        return selection
            .codes
            .iter()
            .map(|code| {
                registry
                    .get(code)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("unknown branch code '{code}'"))
            })
            .collect();
    }

    let limit = selection.max_branches.max(1);
    let prioritized = registry.prioritized(&PRIORITY_CITIES);

    if selection.shipping_only {
        return Ok(prioritized
            .into_iter()
            .filter(|b| b.supports_shipping)
            .take(limit)
            .cloned()
            .collect());
    }

    if selection.weight.is_some() {
        return Ok(prioritized.into_iter().take(limit).cloned().collect());
    }

    let major: Vec<Branch> = MAJOR_BRANCH_CODES
        .iter()
        .filter_map(|code| registry.get(code).cloned())
        .collect();
    if major.is_empty() {
        Ok(prioritized.into_iter().take(limit).cloned().collect())
    } else {
        Ok(major)
    }
}

/// Knobs for one run, resolved from config and flags.
#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub weight: Option<f64>,
    pub max_concurrent: usize,
    pub deadline: Option<Duration>,
    pub alerts_enabled: bool,
    pub error_notifications: bool,
    pub summary_reports: bool,
}

impl RunOptions {
    pub(crate) fn from_config(config: &AppConfig, weight: Option<f64>) -> Self {
        Self {
            weight,
            max_concurrent: config.max_concurrent_branches.max(1),
            deadline: config.run_timeout(),
            alerts_enabled: config.alerts_enabled,
            error_notifications: config.error_notifications,
            summary_reports: config.summary_reports,
        }
    }
}

/// Fetches every branch with at most `options.max_concurrent` in flight.
///
/// Branches that have not started when the deadline passes are recorded as
/// skipped; queries already in flight run to completion.
pub(crate) async fn dispatch<S: StockSource>(
    source: &S,
    branches: &[Branch],
    options: &RunOptions,
) -> RunReport {
    let started_at = Local::now();
    let deadline = options
        .deadline
        .map(|limit| tokio::time::Instant::now() + limit);

    let mut outcomes: Vec<BranchOutcome> = stream::iter(branches)
        .map(|branch| async move {
            if deadline.is_some_and(|d| tokio::time::Instant::now() >= d) {
                tracing::warn!(branch = %branch.code, "run deadline reached; branch skipped");
                return BranchOutcome::Skipped {
                    branch: branch.clone(),
                    reason: "run deadline reached".to_string(),
                };
            }

            let query = StockQuery::new(branch.clone(), options.weight);
            match source.check(&query).await {
                Ok(records) => {
                    tracing::info!(
                        branch = %branch.code,
                        records = records.len(),
                        "branch checked"
                    );
                    BranchOutcome::Checked {
                        branch: branch.clone(),
                        records,
                    }
                }
                Err(error) => {
                    tracing::error!(
                        branch = %branch.code,
                        kind = error.kind(),
                        error = %error,
                        "branch check failed"
                    );
                    BranchOutcome::Failed {
                        branch: branch.clone(),
                        error,
                    }
                }
            }
        })
        .buffer_unordered(options.max_concurrent.max(1))
        .collect()
        .await;

    let order = |b: &Branch| branches.iter().position(|x| x.code == b.code);
    outcomes.sort_by_key(|o| order(o.branch()));

    RunReport {
        started_at,
        finished_at: Local::now(),
        outcomes,
    }
}

/// Sends whatever the run calls for and turns an all-failed run into an error.
///
/// Stock alerts only go out when something is purchasable, and only those
/// records are passed on. Delivery failures are logged, never fatal.
pub(crate) async fn deliver<N: Notifier>(
    report: &RunReport,
    notifier: Option<&N>,
    options: &RunOptions,
) -> anyhow::Result<()> {
    let failed = report.failed_count();
    if failed > 0 {
        tracing::warn!(
            failed_branches = failed,
            total_branches = report.outcomes.len(),
            "some branches failed during the run"
        );
    }

    if report.all_failed() {
        let message = format!(
            "all {} branches failed ({} failed, {} skipped)",
            report.outcomes.len(),
            failed,
            report.skipped_count()
        );
        if let Some(notifier) = notifier.filter(|_| options.error_notifications) {
            if let Err(e) = notifier.send_error_notification(&message, "check run").await {
                tracing::warn!(error = %e, "failed to send error notification");
            }
        }
        anyhow::bail!("run failed: {message}");
    }

    let Some(notifier) = notifier else {
        return Ok(());
    };

    let items = report.alert_items();
    if options.alerts_enabled && !items.is_empty() {
        if let Err(e) = notifier.send_stock_alert(&items).await {
            tracing::warn!(error = %e, "failed to send stock alert");
        }
    }

    if options.summary_reports {
        if let Err(e) = notifier.send_summary_report(&report.summary()).await {
            tracing::warn!(error = %e, "failed to send summary report");
        }
    }

    Ok(())
}

pub(crate) async fn run_check_command(config: &AppConfig, args: &CheckArgs) -> anyhow::Result<()> {
    if let Some(weight) = args.weight {
        if !(weight.is_finite() && weight > 0.0) {
            anyhow::bail!("--weight must be a positive number of grams, got {weight}");
        }
    }

    // Credentials are checked before any request leaves the machine.
    let notifier = build_notifier(config, args.no_notify)?;

    let registry = crate::load_registry(config)?;
    let selection = Selection {
        codes: args.branches.clone(),
        max_branches: args.max_branches,
        shipping_only: args.shipping_only,
        weight: args.weight,
    };
    let branches = select_branches(&registry, &selection)?;
    if branches.is_empty() {
        anyhow::bail!("no branches selected for this run");
    }

    let codes: Vec<&str> = branches.iter().map(|b| b.code.as_str()).collect();
    tracing::info!(branches = %codes.join(", "), weight = ?args.weight, "starting stock check");

    let client = crate::build_stock_client(config)?;
    let options = RunOptions::from_config(config, args.weight);
    let report = dispatch(&client, &branches, &options).await;

    let formats = args
        .export
        .clone()
        .unwrap_or_else(|| config.export_formats.clone());
    for path in write_exports(&report, &config.export_dir, &formats)? {
        println!("exported {}", path.display());
    }

    print_report(&report);
    deliver(&report, notifier.as_ref(), &options).await
}

fn print_report(report: &RunReport) {
    for outcome in &report.outcomes {
        match outcome {
            BranchOutcome::Checked { branch, records } => {
                println!("{} {} ({})", branch.code, branch.name, branch.city);
                if records.is_empty() {
                    println!("  no matching products");
                }
                for record in records {
                    let price = record
                        .price_idr()
                        .map_or_else(|| "price n/a".to_string(), |p| format!("Rp {p}"));
                    println!("  {}g  {}  {}", record.weight_grams, price, record.status);
                }
            }
            BranchOutcome::Failed { branch, error } => {
                println!("{} {} FAILED ({}): {error}", branch.code, branch.name, error.kind());
            }
            BranchOutcome::Skipped { branch, reason } => {
                println!("{} {} skipped: {reason}", branch.code, branch.name);
            }
        }
    }

    let summary = report.summary();
    println!(
        "checked {} branches ({} failed, {} skipped): {} products, {} available",
        summary.branches_checked,
        summary.branches_failed,
        summary.branches_skipped,
        summary.products_scanned,
        summary.available_count
    );
}

#[cfg(test)]
#[path = "check_test.rs"]
mod tests;
