//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod blend;
mod render;
mod warm;

use clap::{ArgAction, Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{mpsc, Arc};

use crate::asset::{BatchReport, DirectorySource, Dispatcher, ImageStore, StoreError};
use crate::config::{load_config, merge_cli_overrides, CliOverrides, TileblendConfig};
use crate::pixel::PixelBuffer;
use crate::progress::{ConsoleProgress, JsonProgress, ProgressReporter};
use crate::tile::{Neighbors, TileId};
use crate::transition::TransitionEngine;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Tileblend - compose floor transition tiles from a directory of images
#[derive(Parser)]
#[command(name = "tileblend")]
#[command(about = "Tileblend - compose floor transition tiles from a directory of images")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (default: tileblend.toml found by walking up from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Asset root directory, overriding the config
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Seed for reproducible blending
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Loader threads (0 loads inline)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,

    /// Report progress as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compose one transition tile
    Blend {
        /// Center tile id
        #[arg(long)]
        center: u32,

        /// Neighbor tile ids as north,east,south,west
        #[arg(long, value_parser = parse_neighbors)]
        neighbors: Neighbors,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render a whole tile map
    Render {
        /// Map file with a `rows` array of tile ids
        #[arg(long)]
        map: PathBuf,

        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Warm the asset cache for every image the catalog lists
    Warm,

    /// List catalog categories
    Catalog,
}

/// Parse `n,e,s,w` into a neighbor set.
pub fn parse_neighbors(s: &str) -> Result<Neighbors, String> {
    let ids = s
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<u32>().map_err(|_| format!("'{}' is not a tile id", part))
        })
        .collect::<Result<Vec<u32>, String>>()?;

    match ids.as_slice() {
        &[n, e, s, w] => Ok(Neighbors::from([n, e, s, w])),
        _ => Err(format!("expected 4 tile ids (north,east,south,west), got {}", ids.len())),
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Blend { center, neighbors, output } => {
            blend::run_blend(&cli.global, TileId(center), neighbors, &output)
        }
        Commands::Render { map, output } => render::run_render(&cli.global, &map, &output),
        Commands::Warm => warm::run_warm(&cli.global),
        Commands::Catalog => warm::run_catalog(&cli.global),
    }
}

/// Install the logger. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

/// Print an error and return the failure exit code.
pub(crate) fn fail(message: impl std::fmt::Display) -> ExitCode {
    eprintln!("Error: {}", message);
    ExitCode::from(EXIT_ERROR)
}

/// Loaded configuration plus the store and engine built from it.
pub(crate) struct Session {
    pub config: TileblendConfig,
    pub store: ImageStore,
    pub engine: TransitionEngine,
}

impl Session {
    /// Load the config, apply CLI overrides and build the store and engine.
    pub fn open(global: &GlobalArgs) -> Result<Self, String> {
        let mut config =
            load_config(global.config.as_deref()).map_err(|e| e.to_string())?;
        let overrides = CliOverrides { root: global.root.clone(), seed: global.seed, jobs: global.jobs };
        merge_cli_overrides(&mut config, &overrides);

        let dispatcher = match config.assets.jobs {
            Some(jobs) if jobs > 0 => Dispatcher::pool(jobs)
                .map_err(|e| format!("cannot start {} loader threads: {}", jobs, e))?,
            _ => Dispatcher::Inline,
        };
        let source = DirectorySource::new(&config.assets.root).with_extension(&config.assets.extension);
        let progress: Box<dyn ProgressReporter> = if global.json {
            Box::new(JsonProgress::new())
        } else {
            Box::new(
                ConsoleProgress::new()
                    .with_colors(std::io::stderr().is_terminal())
                    .with_verbose(global.verbose > 0),
            )
        };
        log::debug!("asset root {}", config.assets.root.display());

        let store = ImageStore::new(config.categories.clone(), Arc::new(source))
            .with_dispatcher(dispatcher)
            .with_progress(progress);

        let mut engine = TransitionEngine::new(config.blend.params())
            .with_floor_category(&config.blend.floor_category);
        if let Some(seed) = config.blend.seed {
            engine = engine.with_seed(seed);
        }

        Ok(Self { config, store, engine })
    }

    /// Retain the floor images of `tiles` and block until they have loaded.
    ///
    /// Fails if any image could not be loaded.
    pub fn retain_tiles(&mut self, tiles: &[TileId]) -> Result<BatchReport, String> {
        let ids: Vec<String> = tiles.iter().map(|t| t.identifier()).collect();
        let floor = self.engine.floor_category().to_string();
        let report = retain_and_wait(&mut self.store, &floor, &ids)?;
        if !report.is_success() {
            let messages: Vec<String> = report.failures.iter().map(|f| format!("  - {}", f)).collect();
            return Err(format!("{} tile image(s) failed to load:\n{}", messages.len(), messages.join("\n")));
        }
        Ok(report)
    }
}

/// Retain `identifiers` and wait for the batch's completion report.
pub(crate) fn retain_and_wait(
    store: &mut ImageStore,
    category: &str,
    identifiers: &[String],
) -> Result<BatchReport, String> {
    let (tx, rx) = mpsc::channel();
    let batch = store
        .retain(category, identifiers, move |report| {
            let _ = tx.send(report);
        })
        .map_err(|e: StoreError| e.to_string())?;
    store.wait(batch);
    rx.try_recv().map_err(|_| format!("{} stopped before all of its loads reported", batch))
}

/// Write a buffer as PNG, creating parent directories.
pub(crate) fn save_png(buffer: &PixelBuffer, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
    }
    buffer
        .as_image()
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| format!("cannot write {}: {}", path.display(), e))
}
