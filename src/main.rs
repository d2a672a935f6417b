mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::{Cli, Command};
use pingme::config::{ensure_db_dir, Config};
use pingme::{board, db, output, web};

fn open_db(db_path: &str) -> Result<Connection> {
    let conn = db::open(db_path)?;
    db::init(&conn)?;
    Ok(conn)
}

fn setup_logging(config: &Config) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app_env.default_log_filter()),
    )
    .format_timestamp_secs()
    .init();
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Command::Serve => {
            setup_logging(&config);
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(web::serve(config))?;
        }

        Command::Init => {
            let db_path = config.db_path()?;
            ensure_db_dir(&db_path)?;
            open_db(&db_path)?;
            eprintln!("Initialized database at {db_path}");
        }

        Command::List { json } => {
            let db_path = config.db_path()?;
            ensure_db_dir(&db_path)?;
            let conn = open_db(&db_path)?;
            let now = web::now();
            let board = board::load(&conn, now)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&board)?);
            } else {
                print!("{}", output::format_board(&board, now));
            }
        }
    }

    Ok(())
}
