/// Backup file naming and retention helpers.
pub mod backup;
/// Environment variable readers shared by configuration loaders.
pub mod env;
/// Shared formatting helpers (uptime, progress bars, sizes).
pub mod formatting;
/// Aged-file cleanup and process memory probes.
pub mod housekeeping;
/// Pure parser helpers.
pub mod parse;
/// Shared time helpers.
pub mod time;

/// Characters that mark a message as a command.
pub const COMMAND_PREFIXES: [char; 3] = ['.', '!', '/'];
/// Prefix used when showing commands back to users.
pub const DISPLAY_PREFIX: char = '.';
