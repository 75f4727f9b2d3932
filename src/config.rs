//! Centralized configuration for mongosnap.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - BackupConfig::from_env() reads MSNAP_* variables; every field can also
//!   be overridden with a fluent setter (CLI flags win over env).

use std::fmt;

use chrono::{DateTime, Utc};

use crate::client::DbTarget;

/// Top-level configuration for one backup run.
#[derive(Clone, Debug)]
pub struct BackupConfig {
    /// Device path of the data volume attachment.
    /// Env: MSNAP_DEVICE (default "/dev/sdf")
    pub device: String,

    /// Environment tag embedded in snapshot descriptions and used to scope
    /// retention. Env: MSNAP_ENV (default "prod")
    pub env: String,

    /// Database host. Env: MSNAP_HOST (default "localhost")
    pub host: String,

    /// Database port. Env: MSNAP_PORT (default 27017)
    pub port: u16,

    /// Cloud region, passed through to the storage client.
    /// Env: MSNAP_REGION (default None, meaning client default chain)
    pub region: Option<String>,

    /// Proceed even if the node currently holds the primary role.
    /// Env: MSNAP_FORCE = 0|1|true|false (default false)
    pub allow_role_override: bool,

    /// Human label prefixed to snapshot descriptions.
    /// Env: MSNAP_LABEL (default "mongosnap")
    pub label: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            device: "/dev/sdf".to_string(),
            env: "prod".to_string(),
            host: "localhost".to_string(),
            port: 27017,
            region: None,
            allow_role_override: false,
            label: "mongosnap".to_string(),
        }
    }
}

fn env_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "yes" || s == "on"
}

impl BackupConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("MSNAP_DEVICE") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.device = s.to_string();
            }
        }
        if let Ok(v) = std::env::var("MSNAP_ENV") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.env = s.to_string();
            }
        }
        if let Ok(v) = std::env::var("MSNAP_HOST") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.host = s.to_string();
            }
        }
        if let Ok(v) = std::env::var("MSNAP_PORT") {
            if let Ok(n) = v.trim().parse::<u16>() {
                cfg.port = n;
            }
        }
        if let Ok(v) = std::env::var("MSNAP_REGION") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.region = Some(s.to_string());
            }
        }
        if let Ok(v) = std::env::var("MSNAP_FORCE") {
            cfg.allow_role_override = env_flag(&v);
        }
        if let Ok(v) = std::env::var("MSNAP_LABEL") {
            let s = v.trim();
            if !s.is_empty() {
                cfg.label = s.to_string();
            }
        }

        cfg
    }

    /// Fluent setters (builder-style) to override specific fields.

    pub fn with_device<S: Into<String>>(mut self, device: S) -> Self {
        self.device = device.into();
        self
    }

    pub fn with_env<S: Into<String>>(mut self, env: S) -> Self {
        self.env = env.into();
        self
    }

    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_region<S: Into<String>>(mut self, region: Option<S>) -> Self {
        self.region = region.map(Into::into);
        self
    }

    pub fn with_role_override(mut self, on: bool) -> Self {
        self.allow_role_override = on;
        self
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = label.into();
        self
    }

    /// Connection parameters of the database this run targets.
    pub fn target(&self) -> DbTarget {
        DbTarget {
            host: self.host.clone(),
            port: self.port,
        }
    }

    /// Description stamped on a new snapshot. The env tag is embedded here
    /// because the storage service's listing filter matches on description.
    pub fn snapshot_description(&self, now: DateTime<Utc>) -> String {
        format!("{}-{}-{}", self.label, self.env, now.format("%Y%m%d%H%M"))
    }
}

impl fmt::Display for BackupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BackupConfig {{ device: {}, env: {}, target: {}:{}, region: {}, force: {}, label: {} }}",
            self.device,
            self.env,
            self.host,
            self.port,
            self.region.as_deref().unwrap_or("default"),
            self.allow_role_override,
            self.label,
        )
    }
}
