pub mod bot_status;
pub mod help;
pub mod menu;
pub mod profile;
pub mod stats;
