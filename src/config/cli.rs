use crate::config::toml_config::DEFAULT_CONFIG_FILE;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "ladder-recipe")]
#[command(about = "Generates hole-drilling recipes for extension ladder sections from an ERP bill of materials")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Parent manufacturing order reference
    #[arg(long)]
    pub parent: String,

    /// Child manufacturing order reference, or B / F
    #[arg(long)]
    pub child: String,

    /// Read the BOM from a JSON snapshot instead of the ERP
    #[arg(long)]
    pub bom_file: Option<String>,

    /// Override the output directory from the config file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override the run timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    /// Run the engine and print the recipes without writing files
    #[arg(long)]
    pub dry_run: bool,
}
