use std::{convert::Infallible, net::SocketAddr};

use axum::{routing::get, Json, Router};
use teloxide::{
    prelude::*,
    update_listeners::{webhooks, UpdateListener},
};

/// Register the webhook with Telegram and serve it, plus `GET /health`, on `0.0.0.0:port`.
///
/// The update path is taken from `url` (`{base}/{secret}`), so the secret segment is the
/// only route that accepts updates.
pub async fn listen(
    bot: Bot,
    port: u16,
    url: &str,
) -> anyhow::Result<impl UpdateListener<Err = Infallible>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let url: reqwest::Url = url.parse()?;

    let (listener, stop_flag, router) =
        webhooks::axum_to_router(bot, webhooks::Options::new(addr, url.clone())).await?;
    let app = with_health(router);

    tokio::spawn(async move {
        if let Err(e) = axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .with_graceful_shutdown(stop_flag)
            .await
        {
            tracing::error!("webhook server failed: {e}");
        }
    });

    tracing::info!(%addr, webhook = %url, "webhook set, server listening");
    Ok(listener)
}

fn with_health(router: Router) -> Router {
    router.route("/health", get(health))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true, "bot": "reply-bot" }))
}
