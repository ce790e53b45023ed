#[derive(Clone, Debug)]
pub struct NewCommandLog<'a> {
    pub user_id: i64,
    pub group_id: Option<&'a str>,
    pub command_name: &'a str,
    pub full_command: &'a str,
    pub success: bool,
    pub response_time_ms: u64,
    pub error_message: Option<&'a str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandLogEntry {
    pub id: i64,
    pub user_id: i64,
    pub group_id: Option<String>,
    pub command_name: String,
    pub full_command: String,
    pub success: bool,
    pub response_time_ms: u64,
    pub error_message: Option<String>,
    pub executed_at: u64,
}
