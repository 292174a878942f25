use serde::{Deserialize, Serialize};

/// Tunables of the console. Every field has a default so partial config
/// files deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Upper bound on the top-level student listing.
    pub list_limit: usize,
    /// Trailing window for "recently contacted".
    pub contact_window_days: u32,
    /// Default sender for logged and follow-up communications.
    pub team_address: String,
    pub follow_up_subject: String,
    pub follow_up_message: String,
    /// Message characters copied into a communication breadcrumb.
    pub breadcrumb_preview_chars: usize,
    /// Entries shown per summary quick list.
    pub quick_list_len: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            list_limit: 500,
            contact_window_days: 7,
            team_address: "team@undergraduation.com".to_string(),
            follow_up_subject: "Follow-up from Undergraduation".to_string(),
            follow_up_message: "Hi! Checking in on your application progress and essays. —Team"
                .to_string(),
            breadcrumb_preview_chars: 80,
            quick_list_len: 8,
        }
    }
}

impl ConsoleSettings {
    pub fn contact_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.contact_window_days))
    }
}
