use std::env;

/// Interpret common truthy spellings (`1`, `true`, `yes`, `on`).
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Typed reads over a key/value source, normally the process environment.
pub struct EnvReader<F> {
    lookup: F,
}

/// Reader over the process environment.
pub fn process_env() -> EnvReader<fn(&str) -> Option<String>> {
    EnvReader::new(lookup_process_env as fn(&str) -> Option<String>)
}

fn lookup_process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Trimmed, non-empty value for `key`.
    pub fn env_optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    pub fn env_bool(&self, key: &str, default: bool) -> bool {
        match (self.lookup)(key) {
            Some(value) => parse_bool(&value),
            None => default,
        }
    }

    pub fn env_u64(&self, key: &str, default: u64) -> u64 {
        match (self.lookup)(key) {
            Some(value) => value.trim().parse::<u64>().unwrap_or(default),
            None => default,
        }
    }

    pub fn env_string(&self, key: &str, default: &str) -> String {
        self.env_optional(key).unwrap_or_else(|| default.to_owned())
    }

    pub fn env_list(&self, key: &str) -> Vec<String> {
        (self.lookup)(key)
            .map(|value| parse_list(&value))
            .unwrap_or_default()
    }
}
