use std::time::Duration;

use crate::binding::BindMode;

#[derive(Debug, Clone)]
pub struct EditorConfig {
    pub bind_mode: BindMode,
    pub token_length: usize,
    pub export_file_name: String,
    pub notice_ttl: Duration,
    pub notice_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            bind_mode: BindMode::Batched,
            token_length: 50,
            export_file_name: "config.toml".to_string(),
            notice_ttl: Duration::from_secs(3),
            notice_capacity: 8,
        }
    }
}
