use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::Context,
};
use snippetbox_cli::{Error, util::ui::UI};
use snippetbox_config::{Config, DatabaseConfig, Environment, load_config, parse_env};
use snippetbox_db::{connect_pool, create_database_if_not_exists, schema};
use sqlx::ConnectOptions;
use sqlx::sqlite::SqliteConnectOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use url::Url;

#[tokio::main]
async fn main() -> ExitCode {
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    let args = Cli::parse();
    let mut ui = UI::new(&mut stdout, &mut stderr, !args.no_color, !args.quiet);

    match cli(&mut ui, args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            ui.error(e.to_string().as_str(), &e.into());
            ExitCode::FAILURE
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "A CLI tool to manage the snippetbox database.", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Choose the environment (development, test, production).", value_parser = parse_env, default_value = "development")]
    env: Environment,

    #[arg(long, global = true, help = "Disable colored output.")]
    no_color: bool,

    #[arg(long, global = true, help = "Disable debug output.")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Drop the database")]
    Drop,
    #[command(about = "Create the database")]
    Create,
    #[command(about = "Create the tables and indexes and seed an empty snippets table")]
    Init,
    #[command(about = "Reset (drop, create, init) the database")]
    Reset,
}

async fn cli(ui: &mut UI<'_>, cli: Cli) -> Result<(), Error> {
    let config: Config = load_config(&cli.env)?;

    match cli.command {
        Commands::Drop => {
            ui.info(&format!("Dropping {} database…", &cli.env));
            let db_name = drop(&config.database)
                .await
                .context("Could not drop database!")?;
            ui.success(&format!("Dropped database {} successfully.", db_name));
        }
        Commands::Create => {
            ui.info(&format!("Creating {} database…", &cli.env));
            let db_name = create(&config).await.context("Could not create database!")?;
            ui.success(&format!("Created database {} successfully.", db_name));
        }
        Commands::Init => {
            ui.info(&format!("Initializing {} database…", &cli.env));
            init(&config)
                .await
                .context("Could not initialize database!")?;
            ui.success("Initialized database successfully.");
        }
        Commands::Reset => {
            ui.info(&format!("Resetting {} database…", &cli.env));
            ui.indent();
            let result = reset(ui, &config)
                .await
                .context("Could not reset the database!");
            ui.outdent();
            let db_name = result?;
            ui.success(&format!("Reset database {} successfully.", db_name));
        }
    }

    Ok(())
}

async fn drop(config: &DatabaseConfig) -> Result<String, Error> {
    let db_file = db_file(config)?;

    match std::fs::remove_file(&db_file) {
        Ok(()) => (),
        // Nothing to drop.
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => (),
        Err(err) => return Err(err.into()),
    }

    Ok(db_file.display().to_string())
}

async fn create(config: &Config) -> Result<String, Error> {
    let db_file = db_file(&config.database)?;
    create_database_if_not_exists(config).await?;

    Ok(db_file.display().to_string())
}

async fn init(config: &Config) -> Result<(), Error> {
    let pool = connect_pool(config)
        .await
        .context("Failed to connect to database!")?;
    schema::initialize(&pool)
        .await
        .context("Failed to create the schema!")?;
    pool.close().await;

    Ok(())
}

async fn reset(ui: &mut UI<'_>, config: &Config) -> Result<String, Error> {
    ui.log("Dropping database…");
    drop(&config.database).await?;
    ui.log("Recreating database…");
    let db_name = create(config).await?;
    ui.log("Creating schema…");
    init(config).await?;

    Ok(db_name)
}

fn db_file(config: &DatabaseConfig) -> Result<PathBuf, Error> {
    let db_url = Url::parse(&config.url).wrap_err("Invalid DATABASE_URL!")?;
    let options = SqliteConnectOptions::from_url(&db_url).wrap_err("Invalid DATABASE_URL!")?;

    Ok(options.get_filename().to_path_buf())
}
