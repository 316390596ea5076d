//! Parsing of incoming chat commands.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BotCommand {
    Start,
    Status,
    On,
    Off,
    /// Brightness as a fraction in `[0, 1]`, already clamped.
    Brightness(f64),
    /// `/brightness` with a missing or non-numeric argument.
    BrightnessUsage,
    Unknown,
}

/// Maps a message text to a command.
///
/// The command word may carry a `@botname` suffix (group chats); anything
/// that is not one of the known commands is ignored upstream.
pub fn parse_command(text: &str) -> BotCommand {
    let mut parts = text.split_whitespace();
    let Some(head) = parts.next() else {
        return BotCommand::Unknown;
    };
    let command = head.split('@').next().unwrap_or(head);
    match command {
        "/start" => BotCommand::Start,
        "/status" => BotCommand::Status,
        "/on" => BotCommand::On,
        "/off" => BotCommand::Off,
        "/brightness" => match parts.next().map(parse_brightness_percent) {
            Some(Some(value)) => BotCommand::Brightness(value),
            _ => BotCommand::BrightnessUsage,
        },
        _ => BotCommand::Unknown,
    }
}

/// Users type whole percent (0-100); the API wants a fraction in `[0, 1]`.
fn parse_brightness_percent(value: &str) -> Option<f64> {
    let percent: i64 = value.trim().parse().ok()?;
    Some(percent.clamp(0, 100) as f64 / 100.0)
}
