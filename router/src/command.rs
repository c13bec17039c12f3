use fortune_common::{FortuneId, LedgerError, ParticipantId};
use serde::{Deserialize, Serialize};

pub const HELP: &str = "\
**Fortune Help**

**fortune** / **fortune random** - Draws a random fortune and sends it to you.
**fortune <ID>** - Redeems the fortune with that ID.
**fortune add <fortune>** - Adds a fortune.
**fortune remove <ID>** - Removes a fortune.
**fortune list** - Lists all fortunes.
**fortune clear** - Clears all fortunes.
**fortune shuffle** - Shuffles all fortunes.
**fortune clean** - Removes every opened fortune.
**fortune info <ID>** - Shows whether a fortune has been opened.
**fortune unparticipate [user]** - Lets a user draw again.
**fortune help** - Shows this help message.";

/// Every command the ledger understands, with typed arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FortuneRequest {
    Add { text: String },
    Remove(FortuneId),
    List,
    Clear,
    Shuffle,
    /// Prune opened fortunes.
    Clean,
    Info(FortuneId),
    /// Draw a random unopened fortune.
    Random,
    /// Redeem a fortune by ID.
    Redeem(FortuneId),
    /// Reset a participant; `None` means the author.
    Unparticipate(Option<ParticipantId>),
    Help,
}

impl FortuneRequest {
    /// Requests that can run under a shared read lock.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            FortuneRequest::List | FortuneRequest::Info(_) | FortuneRequest::Help
        )
    }
}

/// An incoming chat message, as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: ParticipantId,
    #[serde(default)]
    pub is_bot: bool,
    pub content: String,
}

/// Prefix and command word that address the bot, e.g. `!` + `fortune`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSyntax {
    pub prefix: String,
    pub command: String,
}

impl Default for CommandSyntax {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            command: "fortune".to_string(),
        }
    }
}

impl CommandSyntax {
    pub fn new(prefix: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            command: command.into(),
        }
    }

    /// `Ok(None)` for messages that are not addressed to the bot.
    pub fn parse(&self, message: &ChatMessage) -> Result<Option<FortuneRequest>, LedgerError> {
        if message.is_bot {
            return Ok(None);
        }
        let Some(body) = message.content.trim().strip_prefix(self.prefix.as_str()) else {
            return Ok(None);
        };
        let (word, args) = split_word(body);
        if !word.eq_ignore_ascii_case(&self.command) {
            return Ok(None);
        }
        parse_subcommand(args).map(Some)
    }
}

/// Parse everything after the command word.
pub fn parse_subcommand(args: &str) -> Result<FortuneRequest, LedgerError> {
    let (sub, rest) = split_word(args);
    let request = match sub.to_ascii_lowercase().as_str() {
        "" | "random" => FortuneRequest::Random,
        "add" => {
            if rest.is_empty() {
                return Err(LedgerError::invalid_input("you need to provide a fortune"));
            }
            FortuneRequest::Add {
                text: rest.to_string(),
            }
        }
        "remove" => FortuneRequest::Remove(required_id(rest)?),
        "info" => FortuneRequest::Info(required_id(rest)?),
        "list" => FortuneRequest::List,
        "clear" => FortuneRequest::Clear,
        "shuffle" => FortuneRequest::Shuffle,
        "clean" => FortuneRequest::Clean,
        "help" => FortuneRequest::Help,
        "unparticipate" => {
            let (who, _) = split_word(rest);
            let target = if who.is_empty() {
                None
            } else {
                Some(ParticipantId::new(who)?)
            };
            FortuneRequest::Unparticipate(target)
        }
        _ if FortuneId::looks_like_id(sub) => FortuneRequest::Redeem(FortuneId::parse(sub)?),
        _ => return Err(LedgerError::invalid_input("invalid subcommand")),
    };
    Ok(request)
}

fn required_id(rest: &str) -> Result<FortuneId, LedgerError> {
    let (raw, _) = split_word(rest);
    if raw.is_empty() {
        return Err(LedgerError::invalid_input("you need to provide a fortune ID"));
    }
    FortuneId::parse(raw)
}

/// First whitespace-delimited word, and the remainder with leading
/// whitespace removed and inner spacing preserved.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}
