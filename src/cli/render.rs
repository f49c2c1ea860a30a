//! Render command: compose a whole tile map into one image

use std::path::Path;
use std::process::ExitCode;

use super::{fail, save_png, GlobalArgs, Session, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::map::TileMap;

/// Run the render command
pub fn run_render(global: &GlobalArgs, map_path: &Path, output: &Path) -> ExitCode {
    let map = match TileMap::load(map_path) {
        Ok(map) => map,
        Err(e) => {
            eprintln!("Error: {}: {}", map_path.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    if map.is_empty() {
        eprintln!("Error: {} has no cells", map_path.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut session = match Session::open(global) {
        Ok(session) => session,
        Err(e) => return fail(e),
    };
    if let Err(e) = session.retain_tiles(&map.distinct_tiles()) {
        return fail(e);
    }

    let image = match map.render(&mut session.engine, &session.store) {
        Ok(image) => image,
        Err(e) => return fail(e),
    };
    if let Err(e) = save_png(&image, output) {
        return fail(e);
    }

    if !global.json {
        let stats = session.engine.stats();
        println!(
            "Wrote {} ({}x{} cells, {} transitions, {} reused)",
            output.display(),
            map.width(),
            map.height(),
            stats.entries,
            stats.hits
        );
    }
    ExitCode::from(EXIT_SUCCESS)
}
