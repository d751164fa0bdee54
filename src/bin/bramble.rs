use bramble::cli::{run_cli, Cli};
use bramble::logging::{init_logging, LogConfig};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logging = init_logging(&LogConfig::from_env())?;
    run_cli(cli)
}
