use bakerman::config::{self, BakeArgs, BuildOptions};
use bakerman::{output, session};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Run-time switches for a bake.
#[derive(clap::Args, Clone)]
struct BakeFlags {
    /// Only bake these content keys, e.g. --slugs=index,about (never deletes the build dir)
    #[arg(long)]
    slugs: Option<String>,

    /// Remove and recreate the build directory first
    #[arg(
        long,
        action = ArgAction::Set,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    delete_build_dir: bool,

    /// Build directory (overrides build_dir in the config file)
    #[arg(long)]
    build_dir: Option<PathBuf>,

    /// Skip copying static assets
    #[arg(long)]
    skip_static: bool,

    /// Skip copying media files
    #[arg(long)]
    skip_media: bool,
}

impl From<BakeFlags> for BakeArgs {
    fn from(flags: BakeFlags) -> Self {
        Self {
            slugs: flags.slugs,
            delete_build_dir: flags.delete_build_dir,
            build_dir: flags.build_dir,
            skip_static: flags.skip_static,
            skip_media: flags.skip_media,
        }
    }
}

#[derive(Parser)]
#[command(name = "bakerman")]
#[command(about = "Bake a multi-language CMS site into flat HTML files")]
#[command(long_about = "\
Bake a multi-language CMS site into flat HTML files

Every published page is rendered once per language by requesting it from the
running site, post-processed, and written to an index.html under its
language's base code. The primary language is then promoted to the root:

  build/
  ├── index.html            # promoted from en/
  ├── about/index.html      # promoted from en/
  ├── en/
  │   ├── index.html        # /en-us/
  │   └── about/index.html  # /en-us/about/
  ├── de/
  │   ├── index.html        # /de-de/
  │   └── about/index.html  # /de-de/ueber-uns/ (written at the canonical path)
  ├── static/               # copied from [static_files] root
  └── media/                # copied from [media] root

Run 'bakerman gen-config' to generate a documented bake.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render every page in every language into the build directory
    Bake(BakeFlags),
    /// Print a stock bake.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Bake(flags) => {
            let site_config = config::load_config(&cli.config)?;
            let options = BuildOptions::resolve(&site_config, flags.into())?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || output::print_bake_events(rx));
            let result = session::bake(&site_config, &options, Some(tx));
            if printer.join().is_err() {
                log::warn!("progress printer panicked");
            }

            let report = result?;
            output::print_bake_summary(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}
