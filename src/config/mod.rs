#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "market-facets")]
#[command(about = "Listing filter URLs and dashboard submissions for the marketplace")]
pub struct CliConfig {
    /// Path to TOML configuration file (built-in jobs/store pages when omitted)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Listing page to work on
    #[arg(long, default_value = "jobs")]
    pub page: String,

    /// Current page URL, e.g. "/jobs?category=plumbing&page=2"
    #[arg(long)]
    pub url: Option<String>,

    /// Override server.base_url
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Set a field; omit the value (or pass "all") to clear it
    Set { key: String, value: Option<String> },
    /// Toggle one value of a checkbox-style field
    Toggle { key: String, value: String },
    /// Remove one active value, as its chip would
    Remove { key: String, token: String },
    /// Drop every filter, keeping route parameters
    Clear,
    /// List the active filter chips
    Chips,
    /// Submit a form to a named route
    Submit {
        route: String,
        /// Route parameter, key=value
        #[arg(long = "param", value_parser = cli::parse_key_val)]
        params: Vec<(String, String)>,
        /// Text field, key=value
        #[arg(long = "field", value_parser = cli::parse_key_val)]
        fields: Vec<(String, String)>,
        /// List field, key=a,b,c (sent as key[])
        #[arg(long = "list", value_parser = cli::parse_key_val)]
        lists: Vec<(String, String)>,
        /// File attachment, key=path; repeat the key for key[]
        #[arg(long = "file", value_parser = cli::parse_key_val)]
        files: Vec<(String, String)>,
        #[arg(long)]
        force_multipart: bool,
        #[arg(long)]
        preserve_scroll: bool,
    },
}
