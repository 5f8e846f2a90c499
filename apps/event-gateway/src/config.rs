use std::path::PathBuf;
use std::time::Duration;

/// Event gateway configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP/WebSocket server binds to.
    pub port: u16,
    /// Seconds between liveness sweeps.
    pub liveness_interval_secs: u64,
    /// Seconds a new connection may take to send its identity token.
    pub identify_timeout_secs: u64,
    /// Capacity of each connection's outbound queue.
    pub outbound_buffer: usize,
    /// Optional JSON fixture loaded into the in-memory store at startup.
    pub seed_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unset or unparsable values fall back to
    /// the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parsed_var::<u16>("PORT").unwrap_or(defaults.port),
            liveness_interval_secs: parsed_var::<u64>("LIVENESS_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.liveness_interval_secs),
            identify_timeout_secs: parsed_var::<u64>("IDENTIFY_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.identify_timeout_secs),
            outbound_buffer: parsed_var::<usize>("OUTBOUND_BUFFER")
                .filter(|cap| *cap > 0)
                .unwrap_or(defaults.outbound_buffer),
            seed_file: std::env::var("SEED_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.liveness_interval_secs)
    }

    pub fn identify_timeout(&self) -> Duration {
        Duration::from_secs(self.identify_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4003,
            liveness_interval_secs: 30,
            identify_timeout_secs: 10,
            outbound_buffer: 64,
            seed_file: None,
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
