use serde::{Deserialize, Serialize};

/// Per-session playback and lifecycle settings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlayerConfig {
    /// Maximum number of queued tracks per chat (the current track does not
    /// count against this).
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
    /// Close the voice connection on explicit stop and on idle teardown.
    #[serde(default = "default_auto_leave")]
    pub auto_leave: bool,
    /// How long a session may sit idle (no current track, no pending
    /// commands) before it is destroyed.
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    /// Cadence of the registry reaper scan.
    #[serde(default = "default_reap_interval_ms")]
    pub reap_interval_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_queue_size: default_max_queue_size(),
            auto_leave: default_auto_leave(),
            idle_timeout_ms: default_idle_timeout_ms(),
            reap_interval_ms: default_reap_interval_ms(),
        }
    }
}

fn default_max_queue_size() -> usize {
    100
}

fn default_auto_leave() -> bool {
    true
}

fn default_idle_timeout_ms() -> u64 {
    300_000
}

fn default_reap_interval_ms() -> u64 {
    10_000
}
