//! In-game chat command grammar.
//!
//! Players steer the agent with `!`-prefixed chat lines. Parsing is
//! ASCII-case-insensitive on the verb; arguments keep their spelling.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// `!vem`: walk to the player who asked.
    Come,
    /// `!minerar`: collect nearby ores.
    Mine,
    /// `!madeira`: collect nearby logs.
    Wood,
    /// `!craft <item> [count]`
    Craft(CraftRequest),
    /// A malformed `!craft`: answer with usage instead of acting.
    CraftUsage,
    /// `!construir`
    Build,
    /// `!defender`: attack hostile mobs in range.
    Defend,
    /// `!status`: report health, food and position in chat.
    Status,
    /// `!pula`
    Jump,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftRequest {
    pub item: String,
    pub count: u32,
}

/// Parse one chat line. `None` for ordinary chatter and unknown commands.
pub fn parse(message: &str) -> Option<ChatCommand> {
    let mut words = message.split_whitespace();
    let verb = words.next()?.strip_prefix('!')?.to_ascii_lowercase();

    match verb.as_str() {
        "vem" => Some(ChatCommand::Come),
        "minerar" => Some(ChatCommand::Mine),
        "madeira" => Some(ChatCommand::Wood),
        "craft" => Some(parse_craft(words)),
        "construir" => Some(ChatCommand::Build),
        "defender" => Some(ChatCommand::Defend),
        "status" => Some(ChatCommand::Status),
        "pula" => Some(ChatCommand::Jump),
        _ => None,
    }
}

fn parse_craft<'a>(mut args: impl Iterator<Item = &'a str>) -> ChatCommand {
    let Some(item) = args.next() else {
        return ChatCommand::CraftUsage;
    };
    let count = match args.next() {
        None => 1,
        Some(raw) => match raw.parse::<u32>() {
            Ok(count) if count > 0 => count,
            _ => return ChatCommand::CraftUsage,
        },
    };
    ChatCommand::Craft(CraftRequest {
        item: item.to_string(),
        count,
    })
}
