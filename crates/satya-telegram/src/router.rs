use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand as TgBotCommand};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use satya_core::{
    article::HttpArticleSource,
    commands::BotCommand,
    config::Config,
    messaging::port::MessagingPort,
    pipeline::Pipeline,
    ports::{AnalysisBackend, TextRecognizer},
};

use crate::{handlers, TelegramMessenger, TelegramPhotos};

#[derive(Clone)]
pub struct AppState {
    pub messenger: Arc<dyn MessagingPort>,
    pub pipeline: Pipeline,
    /// Bounds how many message pipelines run at once.
    pub admission: Arc<Semaphore>,
}

/// Build the Telegram-side adapters and run long polling until Ctrl-C.
pub async fn run_polling(
    cfg: Arc<Config>,
    backend: Arc<dyn AnalysisBackend>,
    ocr: Arc<dyn TextRecognizer>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!("satya started: @{}", me.username()),
        Err(e) => warn!("get_me failed, continuing: {e}"),
    }
    info!(
        model = %cfg.analysis_model,
        endpoint = %cfg.analysis_base_url,
        max_concurrent = cfg.max_concurrent_analyses,
        "analysis backend configured"
    );

    register_commands(&bot).await;

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(
        bot.clone(),
        cfg.telegram_safe_limit,
    ));
    let pipeline = Pipeline::new(
        cfg.clone(),
        messenger.clone(),
        Arc::new(HttpArticleSource::new(&cfg.article_user_agent)?),
        Arc::new(TelegramPhotos::new(bot.clone())),
        ocr,
        backend,
    );

    let state = Arc::new(AppState {
        messenger,
        pipeline,
        admission: Arc::new(Semaphore::new(cfg.max_concurrent_analyses)),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            debug!(update_id = upd.id, "ignoring non-message update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("satya stopped");
    Ok(())
}

/// Advertise `/start` and `/help` in the client menu (best-effort).
async fn register_commands(bot: &Bot) {
    let commands: Vec<TgBotCommand> = BotCommand::menu()
        .into_iter()
        .map(|(name, description)| TgBotCommand::new(name, description))
        .collect();

    if let Err(e) = bot.set_my_commands(commands).await {
        warn!("failed to register bot commands: {e}");
    }
}
