use std::net::SocketAddr;

use clap::Parser;
use color_eyre::eyre::{Context as _, Result};
use snippetbox_config::get_env;
use snippetbox_web::app::{App, Overrides};

/// Serves Snippetbox.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// HTTP network address, e.g. 127.0.0.1:4000
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// Database connection string, e.g. sqlite://snippetbox.db?mode=rwc
    #[arg(long)]
    dsn: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = get_env().wrap_err("cannot get environment")?;

    App::boot(
        env,
        Overrides {
            addr: cli.addr,
            dsn: cli.dsn,
        },
    )
    .await
    .wrap_err("could not boot app")?;

    Ok(())
}
