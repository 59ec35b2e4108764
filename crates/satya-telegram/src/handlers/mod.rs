//! Telegram update handlers.
//!
//! Translate a teloxide `Message` into the core's `IncomingMessage`, then hand it to
//! the pipeline. Handler errors never reach the dispatcher: failures are logged here.

use std::{future::Future, sync::Arc};

use teloxide::{
    prelude::*,
    types::{MessageEntityKind, PhotoSize},
};
use tokio::sync::Semaphore;
use tracing::{error, info};

use satya_core::{
    commands::BotCommand,
    domain::ChatId,
    messaging::types::{IncomingMessage, PhotoRef},
};

use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);

    if let Some(cmd) = msg.text().and_then(BotCommand::parse) {
        commands::handle_command(state.messenger.as_ref(), chat_id, cmd).await;
        return Ok(());
    }

    let incoming = incoming_from_message(&msg);
    if incoming == IncomingMessage::Unsupported {
        return Ok(());
    }

    let work = state.pipeline.dispatch(chat_id, incoming);
    match admitted(&state.admission, work).await {
        Some(Ok(outcome)) => info!(chat_id = chat_id.0, ?outcome, "message handled"),
        Some(Err(e)) => error!(chat_id = chat_id.0, "failed to deliver reply: {e}"),
        None => error!("admission semaphore closed; dropping message"),
    }
    Ok(())
}

/// Run `work` once a permit is free. Messages beyond the limit wait here; `None` means
/// the semaphore was closed and `work` never ran.
async fn admitted<F: Future>(admission: &Semaphore, work: F) -> Option<F::Output> {
    let _permit = admission.acquire().await.ok()?;
    Some(work.await)
}

/// Classify a Telegram message by payload shape.
pub fn incoming_from_message(msg: &Message) -> IncomingMessage {
    let photos = msg.photo().map(photo_refs).unwrap_or_default();
    let url = first_url(msg);
    IncomingMessage::classify(msg.text(), url.as_deref(), photos)
}

/// Text of the first `url` entity, if any.
fn first_url(msg: &Message) -> Option<String> {
    msg.parse_entities()?
        .into_iter()
        .find(|e| matches!(e.kind(), MessageEntityKind::Url))
        .map(|e| e.text().to_string())
}

fn photo_refs(sizes: &[PhotoSize]) -> Vec<PhotoRef> {
    sizes
        .iter()
        .map(|p| PhotoRef {
            file_id: p.file.id.clone(),
            width: p.width,
            height: p.height,
        })
        .collect()
}
