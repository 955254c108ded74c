use clap::Subcommand;
use envlink_config::{Config, ConfigLoader};

pub mod detect;
pub mod exec;
pub mod parse;
pub mod resolve;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the detected runtime profile
    Detect,

    /// Decode a single reference value
    Parse {
        /// Raw environment value, e.g. `$SecretKeyRef:/projects/...`
        value: String,
    },

    /// Run a resolution pass and report per-variable outcomes
    Resolve {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve, then run a command with the resolved environment
    Exec {
        /// Command and its arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
    },
}

impl Commands {
    pub async fn execute(self) -> eyre::Result<()> {
        match self {
            Commands::Detect => detect::execute(&load_config()?),
            Commands::Parse { value } => parse::execute(&value),
            Commands::Resolve { json } => resolve::execute(&load_config()?, json).await,
            Commands::Exec { command } => exec::execute(&load_config()?, command).await,
        }
    }
}

fn load_config() -> eyre::Result<Config> {
    Ok(ConfigLoader::new().capture_process_env().load()?)
}
