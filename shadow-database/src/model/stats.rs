use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GeneralStats {
    pub total_users: u64,
    pub active_users: u64,
    pub blocked_users: u64,
    pub admin_users: u64,
    pub developer_users: u64,
    pub total_groups: u64,
    pub registered_commands: u64,
    pub commands_today: u64,
    pub average_experience: f64,
    pub max_level: u64,
    pub total_command_usage: u64,
}
