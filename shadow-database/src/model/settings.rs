/// Progression knobs shared by every component that grants rewards or
/// applies warnings. Built once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressionSettings {
    pub level_up_threshold: u64,
    pub max_warnings: u32,
    pub experience_per_command: u64,
    pub diamonds_per_command: u64,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            level_up_threshold: 100,
            max_warnings: 3,
            experience_per_command: 10,
            diamonds_per_command: 1,
        }
    }
}

pub const LEVEL_UP_THRESHOLD_KEY: &str = "level_up_threshold";
pub const MAX_WARNINGS_KEY: &str = "max_warnings";
pub const EXPERIENCE_PER_COMMAND_KEY: &str = "default_experience_per_command";
pub const DIAMONDS_PER_COMMAND_KEY: &str = "default_diamonds_per_command";
