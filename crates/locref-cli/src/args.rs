use clap::{Parser, Subcommand};

/// CLI arguments for locref
#[derive(Debug, Parser)]
#[command(
    name = "locref",
    version,
    about = "Import and inspect the hierarchical location reference dataset"
)]
pub struct CliArgs {
    /// Path to the store snapshot (created on first import)
    #[arg(short = 's', long = "snapshot", global = true, default_value = "locref.bin")]
    pub snapshot: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the import pipeline and update the snapshot
    Run {
        /// Overwrite records that already exist instead of skipping them
        #[arg(long)]
        force: bool,

        /// City batch size between commits (default 100)
        #[arg(long = "chunk-size")]
        chunk_size: Option<usize>,

        /// Read dataset files from a local directory instead of HTTP
        #[arg(long = "from-dir")]
        from_dir: Option<String>,

        /// Override the upstream base URL
        #[arg(long = "base-url")]
        base_url: Option<String>,
    },

    /// Show a summary of the store contents
    Stats,

    /// Lookup a country by ISO2/ISO3 code or name
    Country {
        /// ISO2, ISO3 or full name (e.g. us, USA, "United States")
        code: String,
    },

    /// List all states for a given country
    States {
        /// ISO2 code of the country
        iso2: String,
    },

    /// Show details for a single state
    State {
        /// State name (e.g. Illinois)
        name: String,
    },

    /// List the cities of a state
    Cities {
        /// State name (e.g. Illinois)
        state: String,
    },
}
