pub mod command_logs;
pub mod groups;
pub mod rate_limit;
pub mod settings;
pub mod stats;
pub mod users;
