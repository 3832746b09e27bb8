use std::future::Future;

use crate::client::TelegramNotifier;
use crate::error::NotifyError;
use crate::format::{AlertItem, RunSummary};

/// Delivery channel for run results.
///
/// The check run depends on this trait rather than on [`TelegramNotifier`]
/// so tests can record what would have been sent.
pub trait Notifier: Send + Sync {
    /// Returns `Ok(false)` when nothing was sent because `items` was empty.
    fn send_stock_alert(
        &self,
        items: &[AlertItem],
    ) -> impl Future<Output = Result<bool, NotifyError>> + Send;

    fn send_error_notification(
        &self,
        message: &str,
        context: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;

    /// Returns `Ok(false)` when the summary was suppressed.
    fn send_summary_report(
        &self,
        summary: &RunSummary,
    ) -> impl Future<Output = Result<bool, NotifyError>> + Send;
}

impl Notifier for TelegramNotifier {
    fn send_stock_alert(
        &self,
        items: &[AlertItem],
    ) -> impl Future<Output = Result<bool, NotifyError>> + Send {
        TelegramNotifier::send_stock_alert(self, items)
    }

    fn send_error_notification(
        &self,
        message: &str,
        context: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send {
        TelegramNotifier::send_error_notification(self, message, context)
    }

    fn send_summary_report(
        &self,
        summary: &RunSummary,
    ) -> impl Future<Output = Result<bool, NotifyError>> + Send {
        TelegramNotifier::send_summary_report(self, summary)
    }
}
