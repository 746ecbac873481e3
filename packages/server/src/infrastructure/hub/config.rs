//! Hub tuning knobs.

use std::{fmt, str::FromStr};

/// What the internal dispatch queue does when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Discard the oldest pending broadcast to make room for the new one.
    #[default]
    DropOldest,
    /// Discard the broadcast being pushed.
    DropNewest,
}

impl OverflowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::DropOldest => "drop-oldest",
            OverflowPolicy::DropNewest => "drop-newest",
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop-oldest" => Ok(OverflowPolicy::DropOldest),
            "drop-newest" => Ok(OverflowPolicy::DropNewest),
            other => Err(format!(
                "unknown overflow policy '{other}' (expected drop-oldest or drop-newest)"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Pending envelopes per connection before it is evicted.
    pub outbound_capacity: usize,
    /// Pending commands on the hub's input queue.
    pub command_capacity: usize,
    /// Pending self-triggered broadcasts (`user:joined` / `user:left`).
    pub dispatch_capacity: usize,
    pub overflow_policy: OverflowPolicy,
    /// Evict slow consumers without announcing `user:left`.
    pub silent_eviction: bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
            command_capacity: 1024,
            dispatch_capacity: 1024,
            overflow_policy: OverflowPolicy::default(),
            silent_eviction: false,
        }
    }
}
