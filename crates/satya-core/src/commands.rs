//! Bot commands (`/start`, `/help`).

pub const WELCOME_TEXT: &str =
    "🔍 Welcome to Satya.ai! Send me news links, text, or images to find if it's the real deal.";
pub const HELP_TEXT: &str =
    "Simply send a news link, text, or image to get started with the process";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    /// Any other `/command`. Ignored without a reply.
    Unknown,
}

impl BotCommand {
    /// Parse a command message. Returns `None` when `text` is not a command at all.
    ///
    /// Telegram may send `/cmd@botname arg1 ...`.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.trim_start().split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or("").to_lowercase();

        Some(match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            _ => Self::Unknown,
        })
    }

    /// Fixed reply text, if the command has one.
    pub fn reply(self) -> Option<&'static str> {
        match self {
            Self::Start => Some(WELCOME_TEXT),
            Self::Help => Some(HELP_TEXT),
            Self::Unknown => None,
        }
    }

    /// Commands advertised in the Telegram client menu.
    pub fn menu() -> [(&'static str, &'static str); 2] {
        [
            ("start", "Welcome message"),
            ("help", "How to use the bot"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/HELP"), Some(BotCommand::Help));
        assert_eq!(
            BotCommand::parse("/start@SatyaBot payload"),
            Some(BotCommand::Start)
        );
    }

    #[test]
    fn unknown_and_non_commands() {
        assert_eq!(BotCommand::parse("/stats"), Some(BotCommand::Unknown));
        assert_eq!(BotCommand::Unknown.reply(), None);
        assert_eq!(BotCommand::parse("hello /start"), None);
        assert_eq!(BotCommand::parse(""), None);
    }

    #[test]
    fn replies_are_fixed() {
        assert_eq!(BotCommand::Start.reply(), Some(WELCOME_TEXT));
        assert_eq!(BotCommand::Help.reply(), Some(HELP_TEXT));
    }
}
