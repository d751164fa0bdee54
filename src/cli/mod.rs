//! # CLI Module
//!
//! Command-line front end of the `bramble` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Serve a `/health` endpoint and static directories:
//!
//! ```bash
//! bramble serve --static-dir ./public --prefix /assets --strip 1 --addr 127.0.0.1:8080
//! ```
//!
//! ### `routes`
//!
//! Print the route table a configuration produces:
//!
//! ```bash
//! bramble routes --config bramble.toml
//! ```
//!
//! Both commands read `BRAMBLE_*` environment variables (see
//! [`crate::config`]); `--config` loads a TOML file first.

mod commands;


pub use commands::{build_router, load_config, run_cli, Cli, Commands, RouterArgs};
