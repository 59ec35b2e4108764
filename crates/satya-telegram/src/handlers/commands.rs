use tracing::{debug, warn};

use satya_core::{commands::BotCommand, domain::ChatId, messaging::port::MessagingPort};

pub async fn handle_command(messenger: &dyn MessagingPort, chat_id: ChatId, cmd: BotCommand) {
    let Some(reply) = cmd.reply() else {
        debug!(chat_id = chat_id.0, "ignoring unknown command");
        return;
    };

    if let Err(e) = messenger.send_text(chat_id, reply).await {
        warn!(chat_id = chat_id.0, ?cmd, "failed to answer command: {e}");
    }
}
