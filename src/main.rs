use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "folio",
    version,
    long_version = concat!(env!("FOLIO_VERSION"), " ", env!("BUILD_INFO")),
    about = "Build a personal blog and portfolio site with an RSS feed."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the site.
    Build {
        /// The source directory of the site.
        #[arg(default_value = ".")]
        source: String,
        /// The destination directory.
        #[arg(default_value = "build")]
        dest: String,
        /// Rebuild on every change.
        #[arg(short, long)]
        watch: bool,
    },
    /// New a folio site.
    New {
        /// The directory name of the site, the current directory if absent.
        name: Option<String>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match Cli::parse().command {
        Commands::Build {
            source,
            dest,
            watch,
        } => folio::watch_build(&source, &dest, watch)?,
        Commands::New { name } => folio::new_folio_project(name)?,
    }
    Ok(())
}
