//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "hush".to_string()
}

pub fn default_data_dir() -> String {
    "~/.hush".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_auth_file() -> String {
    "~/.hush/authorized.json".to_string()
}

pub fn default_prefixes() -> Vec<String> {
    vec!["!".to_string(), ".".to_string()]
}

pub fn default_registration_command() -> String {
    "reg".to_string()
}

pub fn default_deny_message() -> String {
    "❌ You are not authorized to use this bot. Please register first.".to_string()
}

pub fn default_failure_message() -> String {
    "❌ Something went wrong while running that command.".to_string()
}

pub fn default_handler_timeout_secs() -> u64 {
    120
}

pub fn default_reconnect_delay_secs() -> u64 {
    3
}

pub fn default_reconnect_max_delay_secs() -> u64 {
    60
}

pub fn default_api_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

pub fn default_instance() -> String {
    "hush".to_string()
}

pub fn default_webhook_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_webhook_port() -> u16 {
    8086
}

pub fn default_audit_db_path() -> String {
    "~/.hush/data/audit.db".to_string()
}
