use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::mpsc;

use wishbot_core::{messaging::types::IncomingUpdate, router::Router};

use crate::convert;

type UpdateSink = mpsc::UnboundedSender<IncomingUpdate>;

/// Poll Telegram and feed every update to `router`, one at a time, in arrival order.
pub async fn run_polling(bot: Bot, router: Arc<Router>) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "wishbot started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed; polling anyway"),
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<IncomingUpdate>();
    let consumer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            router.route(update).await;
        }
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(on_callback))
        .branch(Update::filter_message().endpoint(on_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![tx])
        .build()
        .dispatch()
        .await;

    // The dispatcher owned the last sender; let the consumer finish what's queued.
    consumer.await?;
    Ok(())
}

async fn on_message(msg: Message, tx: UpdateSink) -> ResponseResult<()> {
    match convert::message(&msg) {
        Some(update) => forward(&tx, update),
        None => tracing::debug!(chat_id = msg.chat.id.0, "non-text message ignored"),
    }
    Ok(())
}

async fn on_callback(q: CallbackQuery, tx: UpdateSink) -> ResponseResult<()> {
    forward(&tx, convert::callback(&q));
    Ok(())
}

fn forward(tx: &UpdateSink, update: IncomingUpdate) {
    if tx.send(update).is_err() {
        tracing::error!("update consumer is gone; dropping update");
    }
}
