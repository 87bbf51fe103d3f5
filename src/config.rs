use crate::error::NodeError;

/// Dissemination strategy: push-only, or push plus periodic IHAVE/IWANT
/// anti-entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Push,
    Hybrid,
}

impl std::str::FromStr for Mode {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(Mode::Push),
            "hybrid" => Ok(Mode::Hybrid),
            other => Err(NodeError::Config(format!(
                "unknown mode {other:?}, expected \"push\" or \"hybrid\""
            ))),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Mode::Push => "push",
            Mode::Hybrid => "hybrid",
        })
    }
}

/// Single source of truth for a node's tunables. Built once, passed by
/// value into the node builder, never mutated afterward.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub port: u16,
    pub bootstrap: Option<String>,
    pub fanout: usize,
    pub ttl: u32,
    pub peer_limit: usize,
    pub ping_interval: f64,
    pub peer_timeout: f64,
    pub seed: u64,
    pub mode: Mode,
    pub pull_interval: f64,
    pub ihave_max_ids: usize,
    pub pow_k: u32,
}

impl NodeConfig {
    pub fn self_addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.fanout == 0 {
            return Err(NodeError::Config("fanout must be >= 1".into()));
        }
        if self.peer_limit == 0 {
            return Err(NodeError::Config("peer-limit must be >= 1".into()));
        }
        if self.ping_interval <= 0.0 {
            return Err(NodeError::Config("ping-interval must be > 0".into()));
        }
        if self.mode == Mode::Hybrid && self.pull_interval <= 0.0 {
            return Err(NodeError::Config("pull-interval must be > 0 in hybrid mode".into()));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            bootstrap: None,
            fanout: 3,
            ttl: 8,
            peer_limit: 20,
            ping_interval: 2.0,
            peer_timeout: 6.0,
            seed: 42,
            mode: Mode::Push,
            pull_interval: 2.0,
            ihave_max_ids: 32,
            pow_k: 0,
        }
    }
}
