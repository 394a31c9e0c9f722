//! Configuration types.
//!
//! Filled once at startup from command-line flags (see the `sms-mock` binary) and
//! immutable afterwards. There is no config file or environment layer.

use serde::Deserialize;

use crate::auth::Credentials;

/// Top-level server config.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// TCP port for the HTTP gateway (default 8080).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0", all interfaces).
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Basic-Auth username required by the send endpoint. Empty by default.
    #[serde(default)]
    pub username: String,

    /// Basic-Auth password required by the send endpoint. Empty by default.
    #[serde(default)]
    pub password: String,
}

fn default_port() -> u16 {
    8080
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Config {
    /// `bind:port` as passed to the listener.
    pub fn bind_addr(&self) -> String {
        let bind = self.bind.trim();
        if bind.contains(':') && !bind.starts_with('[') {
            format!("[{}]:{}", bind, self.port)
        } else {
            format!("{}:{}", bind, self.port)
        }
    }

    /// The single credential pair the send endpoint accepts.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}
