use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::{Path, PathBuf};

use wordwall_core::memory::{LoadOrderSnapshot, MemoryHost};
use wordwall_core::{Patcher, PatcherError, PatcherPaths, PatcherSettings, RunSummary};

#[derive(Debug, Parser)]
#[command(
    name = "random-word-walls",
    version,
    about = "Shuffle word wall words and shouts across a load order"
)]
struct Args {
    /// Directory holding rwwSettings.json; rwwLog.txt is written there too.
    #[arg(long)]
    patcher_dir: PathBuf,

    /// Load order snapshot (JSON) to patch.
    #[arg(long)]
    load_order: PathBuf,

    /// Where to write the patched snapshot. Defaults to overwriting
    /// --load-order.
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Patch the hardcodedWalls list instead of following triggers.
    #[arg(long, default_value_t = false)]
    hardcoded: bool,

    #[arg(long, default_value_t = false)]
    no_esl: bool,

    /// Print the run log when done.
    #[arg(long, default_value_t = false)]
    show_log: bool,

    #[arg(long, default_value = wordwall_core::DEFAULT_PATCH_FILE_NAME)]
    patch_file_name: String,

    /// Plugin to leave out; repeatable.
    #[arg(long = "ignore", value_name = "PLUGIN")]
    ignored_files: Vec<String>,

    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn setup_logging(verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<LoadOrderSnapshot, PatcherError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn patch_snapshot(args: &Args, settings: PatcherSettings) -> Result<RunSummary, PatcherError> {
    let mut host = MemoryHost::new(read_snapshot(&args.load_order)?)?;
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let summary = Patcher::new(
        &mut host,
        settings,
        PatcherPaths::new(&args.patcher_dir),
        rng,
    )
    .run()?;

    let output = args.output.as_ref().unwrap_or(&args.load_order);
    let json = serde_json::to_string_pretty(host.snapshot())?;
    fs::write(output, json)?;
    log::info!("Wrote patched load order to {}", output.display());

    Ok(summary)
}

fn main() {
    let args = Args::parse();

    if let Err(e) = setup_logging(args.verbose) {
        eprintln!("Failed to set up logging: {e}");
    }

    let settings = PatcherSettings {
        is_dynamic: !args.hardcoded,
        set_esl: !args.no_esl,
        show_log: args.show_log,
        patch_file_name: args.patch_file_name.clone(),
        ignored_files: args.ignored_files.clone(),
    };
    let show_log = settings.show_log;

    match patch_snapshot(&args, settings) {
        Ok(summary) => {
            log::info!("Randomized {} word walls.", summary.patched);
            if show_log {
                println!("{}", summary.report);
            }
        }
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
