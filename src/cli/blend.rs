//! Blend command: compose a single transition tile

use std::path::Path;
use std::process::ExitCode;

use super::{fail, save_png, GlobalArgs, Session, EXIT_SUCCESS};
use crate::tile::{Neighbors, TileId};

/// Run the blend command
pub fn run_blend(global: &GlobalArgs, center: TileId, neighbors: Neighbors, output: &Path) -> ExitCode {
    let mut session = match Session::open(global) {
        Ok(session) => session,
        Err(e) => return fail(e),
    };

    let tiles = session.engine.source_tiles(center, neighbors);
    if let Err(e) = session.retain_tiles(&tiles) {
        return fail(e);
    }

    let tile = match session.engine.get_transition(&session.store, center, neighbors) {
        Ok(tile) => tile,
        Err(e) => return fail(e),
    };
    if let Err(e) = save_png(&tile, output) {
        return fail(e);
    }

    if !global.json {
        println!("Wrote {} ({}x{})", output.display(), tile.width(), tile.height());
    }
    ExitCode::from(EXIT_SUCCESS)
}
