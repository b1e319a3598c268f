use std::sync::Arc;

use teloxide::{
    dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*,
    types::UserId,
};

use relay_core::{
    config::{Config, Transport},
    messaging::{
        paced::{PacedMessenger, Pacing},
        port::MessagingPort,
    },
    relay::Relay,
    threads::ThreadStore,
};

use crate::handlers;
use crate::webhook;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
    /// This bot's own user id; replies only count when they target its messages.
    pub bot_id: UserId,
}

/// Run the bot until Ctrl-C, over long polling or a webhook depending on config.
pub async fn run(cfg: Arc<Config>, threads: Arc<ThreadStore>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    let me = bot.get_me().await?;
    tracing::info!(
        bot = %me.username(),
        group = %cfg.group_id,
        threads = threads.file().len(),
        secondary = threads.secondary().is_some(),
        "relay bot started"
    );

    // Spacing only; the raw messenger never retries and neither does the pacer.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(PacedMessenger::new(
        raw_messenger,
        cfg.group_id,
        Pacing::default(),
    ));

    let state = Arc::new(AppState {
        relay: Arc::new(Relay::new(&cfg, messenger, threads)),
        bot_id: me.id,
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build();

    match &cfg.transport {
        Transport::Polling => {
            tracing::info!("using long polling");
            dispatcher.dispatch().await;
        }
        Transport::Webhook { port, .. } => {
            let url = cfg
                .transport
                .webhook_url()
                .ok_or_else(|| anyhow::anyhow!("webhook transport without url"))?;
            let listener = webhook::listen(bot, *port, &url).await?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("webhook update listener error"),
                )
                .await;
        }
    }

    tracing::info!("relay bot stopped");
    Ok(())
}
