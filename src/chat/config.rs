//! Behaviour toggles for the conversation engine.

use serde::{Deserialize, Serialize};

/// Configuration for session routing and notification behaviour.
///
/// # Examples
///
/// ```
/// use palaver::chat::config::ChatConfig;
///
/// let config = ChatConfig::default();
/// assert!(config.allow_non_roster_messaging);
/// assert!(config.send_chat_state_notifications);
/// assert!(!config.filter_by_resource);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether messages from peers outside the roster are admitted.
    pub allow_non_roster_messaging: bool,
    /// Whether chat state notifications are sent to peers.
    pub send_chat_state_notifications: bool,
    /// Whether stanzas addressed to a different resource of the account
    /// are ignored.
    pub filter_by_resource: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            allow_non_roster_messaging: true,
            send_chat_state_notifications: true,
            filter_by_resource: false,
        }
    }
}
