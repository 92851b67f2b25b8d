use std::sync::Arc;

use wishbot_core::{config::Config, router::Router, store::SqliteStore};
use wishbot_telegram::TelegramMessenger;

mod console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    wishbot_core::logging::init("wishbot", cfg.mode)?;
    tracing::info!(mode = ?cfg.mode, db = %cfg.db_path.display(), "starting");

    let store = Arc::new(SqliteStore::open(&cfg.db_path, cfg.db_max_connections).await?);

    let bot = wishbot_telegram::bot(&cfg.telegram_bot_token);
    let replies = Arc::new(TelegramMessenger::new(bot.clone()));
    let notifications = TelegramMessenger::throttled(bot.clone(), cfg.throttle);
    let router = Arc::new(Router::new(store, replies, notifications));

    if cfg.console_enabled {
        let flows = router.flows();
        tokio::spawn(async move {
            if let Err(e) = console::run(flows).await {
                tracing::error!(error = %e, "console stopped");
            }
        });
    }

    wishbot_telegram::router::run_polling(bot, router).await
}
