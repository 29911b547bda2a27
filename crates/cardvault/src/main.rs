use crate::prelude::*;
use clap::Parser;
use std::path::PathBuf;

mod catalog;
mod enrich;
mod error;
mod import;
mod prelude;
mod store;
mod view;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Import, price, and browse a trading card collection"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Collection owner
    #[clap(long, env = "CARDVAULT_USER", global = true, default_value = "local")]
    user: String,

    /// Directory for the local collection store
    #[clap(long, env = "CARDVAULT_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "CARDVAULT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Import a CSV collection export, replacing the stored collection
    Import(crate::import::ImportOptions),

    /// Look up market prices and images for every stored record
    Enrich(crate::enrich::EnrichOptions),

    /// Browse the stored collection one page at a time
    View(crate::view::ViewOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Import(options) => crate::import::run(options, app.global).await,
        SubCommands::Enrich(options) => crate::enrich::run(options, app.global).await,
        SubCommands::View(options) => crate::view::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
