use anyhow::{anyhow, Context as _};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{RouterConfig, StaticMount};
use crate::context::Context;
use crate::router::{MethodMatch, Registrar, Router};
use crate::server::{HttpServer, RouterService};

/// Command-line interface for Bramble
///
/// Serves static directories behind the router, or prints the route table a
/// configuration produces.
#[derive(Parser)]
#[command(name = "bramble")]
#[command(about = "Bramble router CLI", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that builds a router.
#[derive(Args, Debug, Clone)]
pub struct RouterArgs {
    /// TOML configuration file (environment variables still apply on top)
    #[arg(short, long, env = "BRAMBLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to serve in addition to the configured mounts
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Request prefix for --static-dir
    #[arg(long, default_value = "/")]
    pub prefix: String,

    /// Leading path segments stripped before mapping onto --static-dir
    #[arg(long, default_value_t = 0)]
    pub strip: usize,

    /// Let OPTIONS requests match routes of any method
    #[arg(long, default_value_t = false)]
    pub cors: bool,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the configured routes over HTTP
    Serve {
        #[command(flatten)]
        router: RouterArgs,

        /// Listen address (overrides the configuration)
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Print the route table and exit
    Routes {
        #[command(flatten)]
        router: RouterArgs,
    },
}

/// Resolve the configuration for `args`.
///
/// # Errors
///
/// Fails when the configuration file cannot be read or parsed.
pub fn load_config(args: &RouterArgs) -> anyhow::Result<RouterConfig> {
    let mut config = match &args.config {
        Some(path) => RouterConfig::load(path)?,
        None => RouterConfig::from_env(),
    };
    if let Some(dir) = &args.static_dir {
        config.static_mounts.push(StaticMount {
            prefix: args.prefix.clone(),
            dir: dir.clone(),
            strip: args.strip,
        });
    }
    if args.cors {
        config.method_match = MethodMatch::Cors;
    }
    Ok(config)
}

/// Build the router the CLI serves: a `/health` endpoint plus every static
/// mount of `config`.
///
/// # Errors
///
/// Fails when two mounts (or a mount and `/health`) collide.
pub fn build_router(config: &RouterConfig) -> crate::Result<Router> {
    let mut router = Router::with_config(config);
    router.get("/health", |ctx: &mut Context| {
        ctx.json(200, &serde_json::json!({ "status": "ok" }))?;
        Ok(())
    })?;
    for mount in &config.static_mounts {
        router.serve_static(&mount.prefix, mount.dir.clone(), mount.strip)?;
    }
    Ok(router)
}

/// Run a parsed command line.
///
/// # Errors
///
/// Propagates configuration, registration and server start-up failures.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { router, addr } => {
            let mut config = load_config(&router)?;
            if let Some(addr) = addr {
                config.addr = addr;
            }
            may::config().set_stack_size(config.stack_size);

            let router = Arc::new(build_router(&config).context("failed to build router")?);
            info!(
                addr = %config.addr,
                routes = router.routes().count(),
                method_match = ?router.method_match(),
                path_mode = ?router.path_mode(),
                stack_size = config.stack_size,
                "Starting server"
            );
            let handle = HttpServer(RouterService::new(router))
                .start(config.addr.as_str())
                .with_context(|| format!("failed to start server on {}", config.addr))?;
            handle
                .join()
                .map_err(|e| anyhow!("server failed: {e:?}"))
        }
        Commands::Routes { router } => {
            let config = load_config(&router)?;
            let router = build_router(&config).context("failed to build router")?;
            for route in router.routes() {
                println!("{route}");
            }
            Ok(())
        }
    }
}
