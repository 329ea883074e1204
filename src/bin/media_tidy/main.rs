use std::path::PathBuf;

use anyhow::bail;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use media_tidy::config::{CliOptions, Config};
use media_tidy::media_type::MediaType;
use media_tidy::tidy::MediaTidy;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Normalize, merge and clean up media library folders"
)]
struct Args {
    /// Media library directory
    #[arg(value_hint = clap::ValueHint::DirPath)]
    path: Option<PathBuf>,

    /// Accept all defaults without prompting
    #[arg(short = 'f', long)]
    force: bool,

    /// Skip media type detection
    #[arg(short = 't', long = "type", value_enum, value_name = "TYPE")]
    media_type: Option<MediaType>,

    /// Only print changes without renaming, merging or writing the cleanup script
    #[arg(short = 'p', long)]
    print: bool,

    /// Create shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Enable debug prints
    #[arg(short = 'D', long)]
    debug: bool,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn cli_options(&self) -> CliOptions {
        CliOptions {
            debug: self.debug,
            dryrun: self.print,
            force: self.force,
            media_type: self.media_type,
            verbose: self.verbose,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(shell) = args.completion {
        return media_tidy::generate_shell_completion(shell, Args::command(), true, env!("CARGO_BIN_NAME"));
    }

    let Some(path) = args.path.as_deref() else {
        println!("Usage: {} <target_folder> [--force|-f]", env!("CARGO_BIN_NAME"));
        std::process::exit(1);
    };

    let root = media_tidy::resolve_input_path(Some(path))?;
    if !root.is_dir() {
        bail!("Target is not a directory: {}", root.display());
    }

    let config = Config::from_cli(args.cli_options())?;
    MediaTidy::new(root, config).run()?;
    Ok(())
}
