use std::io::BufRead;

use clap::Subcommand;
use pomodoro_pro_core::storage::AdvisoryConfig;
use pomodoro_pro_core::Config;

use super::{CliResult, Context};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.work_duration", "advisory.provider")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List {
        /// Print the whole file as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset config to defaults
    Reset,
    /// Save the advisory API key to the system keyring
    SetKey {
        /// Key value; read from stdin when omitted
        value: Option<String>,
    },
    /// Remove the advisory API key from the system keyring
    ClearKey,
}

pub fn run(action: ConfigAction) -> CliResult {
    let mut ctx = Context::load()?;

    match action {
        ConfigAction::Get { key } => match ctx.config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            ctx.config.set(&key, &value)?;
            ctx.config.save()?;
            println!("ok");
        }
        ConfigAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ctx.config)?);
            } else {
                for (key, value) in ctx.config.entries() {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
        ConfigAction::SetKey { value } => {
            let value = match value {
                Some(value) => value,
                None => {
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                    line
                }
            };
            AdvisoryConfig::store_api_key(&value)?;
            println!("API key saved to keyring");
        }
        ConfigAction::ClearKey => {
            AdvisoryConfig::clear_api_key()?;
            println!("API key removed from keyring");
        }
    }
    Ok(())
}
