use crate::COMMAND_PREFIXES;

/// A command invocation split out of a raw message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Split a prefixed message into a lowercased command name and its
/// whitespace-separated arguments. Returns `None` for ordinary text and for
/// a prefix with nothing after it.
pub fn parse_command(content: &str) -> Option<ParsedCommand> {
    let trimmed = content.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    if !COMMAND_PREFIXES.contains(&first) {
        return None;
    }

    let mut parts = chars.as_str().split_whitespace();
    let name = parts.next()?.to_lowercase();

    Some(ParsedCommand {
        name,
        args: parts.map(str::to_owned).collect(),
    })
}

/// Keep only the digits of a user-supplied phone number or mention.
pub fn normalize_phone_number(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() { None } else { Some(digits) }
}

/// Join trailing arguments into a free-text reason, falling back to `default`.
pub fn join_reason(args: &[String], default: &str) -> String {
    let joined = args.join(" ");
    let joined = joined.trim();
    if joined.is_empty() {
        default.to_owned()
    } else {
        joined.to_owned()
    }
}
