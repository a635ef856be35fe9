//! `agridash` - CLI for the agridash observation server
//!
//! This binary runs the server and drives the dashboard client from a
//! terminal.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use agridash::cli::{ChartsCommand, Cli, Command, ConfigCommand, ListCommand, SubmitCommand};
use agridash::dashboard::{self, ApiClient, Charts, Dashboard, DashboardState};
use agridash::{init_logging, server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    match cli.command {
        Command::Serve(cmd) => {
            let mut config = load_config(cli.config)?;
            cmd.apply(&mut config);
            config.validate()?;
            server::serve(&config).await?;
        }
        Command::Submit(cmd) => handle_submit(&load_config(cli.config)?, &cmd).await?,
        Command::List(cmd) => handle_list(&load_config(cli.config)?, &cmd).await?,
        Command::Charts(cmd) => handle_charts(&load_config(cli.config)?, &cmd).await?,
        Command::Watch => handle_watch(&load_config(cli.config)?).await?,
        // Loads on its own so a broken file can still be inspected.
        Command::Config(cmd) => handle_config(cli.config, cmd)?,
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    Config::load_from(path).context("failed to load configuration")
}

async fn handle_submit(config: &Config, cmd: &SubmitCommand) -> Result<()> {
    let session = Dashboard::from_config(config)?;
    for (field, value) in cmd.fields() {
        session.set_field(field, value);
    }

    let result = session.submit().await;
    if let Some(message) = session.snapshot().alert().message() {
        println!("{message}");
    }

    let stored = result?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}

async fn handle_list(config: &Config, cmd: &ListCommand) -> Result<()> {
    let records = ApiClient::from_config(config)?.list().await?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", dashboard::render_table(&records));
    }
    Ok(())
}

async fn handle_charts(config: &Config, cmd: &ChartsCommand) -> Result<()> {
    let records = ApiClient::from_config(config)?.list().await?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&Charts::project(&records))?);
    } else {
        let state = DashboardState::default().with_listing(records);
        print!("{}", dashboard::render(&state));
    }
    Ok(())
}

async fn handle_watch(config: &Config) -> Result<()> {
    let session = Dashboard::from_config(config)?;
    let mut updates = session.watch();
    let feed = session.start().await;

    let initial = updates.borrow_and_update().clone();
    print!("{}", dashboard::render(&initial));

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                println!();
                print!("{}", dashboard::render(&state));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    feed.stop();
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_config(&config);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!("[Storage]");
    println!("  Database path:        {}", config.database_path().display());
    println!();
    println!("[Server]");
    println!("  Listen address:       {}", config.listen_addr());
    println!("  Allowed origin:       {}", config.server.allowed_origin);
    println!("  Broadcast capacity:   {}", config.server.broadcast_capacity);
    println!("  Keep-alive (secs):    {}", config.server.keep_alive_secs);
    println!();
    println!("[Client]");
    println!("  Base URL:             {}", config.client.base_url);
    println!("  Reconnect delay (ms): {}", config.client.reconnect_delay_ms);
    println!("  Request timeout (ms): {}", config.client.request_timeout_ms);
}
