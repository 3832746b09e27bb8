use lmstock_core::AppConfig;
use lmstock_notify::TelegramNotifier;

/// Builds the Telegram notifier for a run, or `None` when no message kind is
/// enabled or `--no-notify` was given.
///
/// Fails when notifications are wanted but the bot token or chat id is
/// missing, before the run touches the network.
pub(crate) fn build_notifier(
    config: &AppConfig,
    no_notify: bool,
) -> anyhow::Result<Option<TelegramNotifier>> {
    if no_notify || !config.notifications_wanted() {
        tracing::debug!("Telegram notifications disabled for this run");
        return Ok(None);
    }
    let credentials = config.require_telegram()?;
    let notifier = TelegramNotifier::new(&credentials, config.request_timeout_secs)
        .map_err(|e| anyhow::anyhow!("failed to build Telegram client: {e}"))?;
    Ok(Some(notifier))
}

pub(crate) async fn run_notify_test(config: &AppConfig) -> anyhow::Result<()> {
    let credentials = config.require_telegram()?;
    let notifier = TelegramNotifier::new(&credentials, config.request_timeout_secs)
        .map_err(|e| anyhow::anyhow!("failed to build Telegram client: {e}"))?;

    let bot = notifier.check_connection().await?;
    println!("connected as @{bot}");

    let text = format!(
        "✅ *LogamMulia Checker*\nTest message from @{}\n📅 {}",
        lmstock_notify::format::escape_markdown(&bot),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let message_id = notifier.send_message(&text).await?;
    println!("test message sent (message_id {message_id})");
    Ok(())
}
