use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Load the next page of a collection (or refresh its head) and enrich its items
    Sync {
        #[arg(long, help = "Directory holding the local sync database")]
        state_dir: PathBuf,

        #[arg(long, help = "JSON fixture standing in for the remote service")]
        fixture: PathBuf,

        #[arg(long, default_value = "popular", help = "Collection to synchronize")]
        collection: String,

        #[arg(long, help = "Reload page 0 instead of the next page")]
        refresh: bool,

        #[arg(long, help = "Bypass the local cache and always hit the remote")]
        force: bool,

        #[arg(
            long,
            help = "Keep enriching after a failure and report all failures at the end"
        )]
        best_effort: bool,

        #[arg(long, help = "Maximum concurrent enrichment calls, 0 for unbounded")]
        concurrency: Option<usize>,

        #[arg(long, help = "JSON settings file")]
        settings: Option<PathBuf>,

        #[arg(long, help = "Print the outcome as JSON")]
        json: bool,
    },
    /// Show the paging state of a collection
    Status {
        #[arg(long, help = "Directory holding the local sync database")]
        state_dir: PathBuf,

        #[arg(long, default_value = "popular", help = "Collection to inspect")]
        collection: String,

        #[arg(long, help = "JSON settings file, used for the refresh window")]
        settings: Option<PathBuf>,

        #[arg(
            long,
            help = "If set, prints the status as JSON instead of a table"
        )]
        json: bool,
    },
}
