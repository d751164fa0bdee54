//! # Configuration Module
//!
//! [`RouterConfig`] gathers everything needed to build a [`Router`](crate::Router)
//! and run it behind the HTTP server. It is an explicit value: build it once,
//! pass it to [`Router::with_config`](crate::Router::with_config); nothing is
//! read from process-wide state afterwards.
//!
//! ## Sources
//!
//! - Defaults ([`RouterConfig::default`])
//! - A TOML document ([`RouterConfig::from_toml_str`], [`RouterConfig::load`])
//! - Environment variables, applied on top ([`RouterConfig::from_env`])
//!
//! ## Environment Variables
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `BRAMBLE_METHOD_MATCH` | `exact` or `cors` | `exact` |
//! | `BRAMBLE_DOMAIN_ROUTING` | `true`/`false`, enables host routes | `false` |
//! | `BRAMBLE_POOL_PREWARM` | contexts allocated per tree up front | `0` |
//! | `BRAMBLE_STACK_SIZE` | coroutine stack size, decimal or `0x` hex | `0x4000` |
//! | `BRAMBLE_ADDR` | listen address | `0.0.0.0:8080` |
//!
//! Unparsable values are logged and ignored.
//!
//! ## Example
//!
//! ```toml
//! method_match = "cors"
//! domain_routing = true
//! stack_size = 0x8000
//! addr = "127.0.0.1:9000"
//!
//! [[static_mounts]]
//! prefix = "/assets"
//! dir = "public"
//! strip = 1
//! ```

use anyhow::Context as _;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Result, RouterError};
use crate::router::MethodMatch;

/// Default coroutine stack size (16 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// A directory served under a request prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaticMount {
    /// Request prefix, e.g. `/assets`
    pub prefix: String,
    /// Directory on disk
    pub dir: PathBuf,
    /// Leading path segments removed before mapping onto `dir`
    #[serde(default)]
    pub strip: usize,
}

/// Router and server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Method comparison strategy
    pub method_match: MethodMatch,
    /// Accept host routes and match them against `host + path`
    pub domain_routing: bool,
    /// Idle contexts allocated for every new method tree
    pub pool_prewarm: usize,
    /// Coroutine stack size in bytes
    pub stack_size: usize,
    /// Listen address of the HTTP server
    pub addr: String,
    /// Static directories to mount
    pub static_mounts: Vec<StaticMount>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            method_match: MethodMatch::Exact,
            domain_routing: false,
            pool_prewarm: 0,
            stack_size: DEFAULT_STACK_SIZE,
            addr: DEFAULT_ADDR.to_string(),
            static_mounts: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Defaults overridden by `BRAMBLE_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| env::var(key).ok());
        config
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// [`RouterError::Config`] when the document is not valid TOML or has
    /// values of the wrong type.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| RouterError::Config(e.to_string()))
    }

    /// Load a TOML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&source)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.apply_env(|key| env::var(key).ok());
        Ok(config)
    }

    /// Override fields from variables returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("BRAMBLE_METHOD_MATCH") {
            match val.parse() {
                Ok(mode) => self.method_match = mode,
                Err(err) => warn!(value = %val, error = %err, "Ignoring BRAMBLE_METHOD_MATCH"),
            }
        }
        if let Some(val) = lookup("BRAMBLE_DOMAIN_ROUTING") {
            match parse_bool(&val) {
                Some(flag) => self.domain_routing = flag,
                None => warn!(value = %val, "Ignoring BRAMBLE_DOMAIN_ROUTING"),
            }
        }
        if let Some(val) = lookup("BRAMBLE_POOL_PREWARM") {
            match val.trim().parse() {
                Ok(count) => self.pool_prewarm = count,
                Err(_) => warn!(value = %val, "Ignoring BRAMBLE_POOL_PREWARM"),
            }
        }
        if let Some(val) = lookup("BRAMBLE_STACK_SIZE") {
            match parse_stack_size(&val) {
                Some(size) => self.stack_size = size,
                None => warn!(value = %val, "Ignoring BRAMBLE_STACK_SIZE"),
            }
        }
        if let Some(val) = lookup("BRAMBLE_ADDR") {
            if val.trim().is_empty() {
                warn!("Ignoring empty BRAMBLE_ADDR");
            } else {
                self.addr = val.trim().to_string();
            }
        }
    }
}

/// Parse a stack size given in decimal or as `0x` hex.
#[must_use]
pub fn parse_stack_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
