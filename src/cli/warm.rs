//! Catalog commands: warm the asset cache, list categories

use std::process::ExitCode;
use std::sync::mpsc;

use super::{fail, GlobalArgs, Session, EXIT_ERROR, EXIT_SUCCESS};
use crate::asset::BatchReport;
use crate::progress::format_duration;

/// Run the warm command
pub fn run_warm(global: &GlobalArgs) -> ExitCode {
    let mut session = match Session::open(global) {
        Ok(session) => session,
        Err(e) => return fail(e),
    };

    let (tx, rx) = mpsc::channel();
    let batch = session.store.warm_catalog(Some(Box::new(move |report: BatchReport| {
        let _ = tx.send(report);
    })));
    session.store.wait(batch);

    let report = match rx.try_recv() {
        Ok(report) => report,
        Err(_) => return fail(format!("{} stopped before all of its loads reported", batch)),
    };

    if !global.json {
        println!(
            "Warmed {} of {} assets in {}",
            report.loaded.len(),
            report.total(),
            format_duration(report.duration.as_millis() as u64)
        );
        for failure in &report.failures {
            eprintln!("  failed: {}", failure);
        }
    }

    if report.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the catalog command
pub fn run_catalog(global: &GlobalArgs) -> ExitCode {
    let session = match Session::open(global) {
        Ok(session) => session,
        Err(e) => return fail(e),
    };
    let catalog = &session.config.categories;

    if global.json {
        return match serde_json::to_string_pretty(catalog) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::from(EXIT_SUCCESS)
            }
            Err(e) => fail(e),
        };
    }

    println!("Asset root: {}", session.config.assets.root.display());
    for (name, spec) in catalog.categories() {
        let tier = if spec.retain { "retain" } else { "cache" };
        let identifiers = if spec.identifiers.is_empty() {
            "any identifier".to_string()
        } else {
            format!("{} identifiers", spec.identifiers.len())
        };
        println!("  {:<12} {:>4}x{:<4} {:<7} {}", name, spec.width, spec.height, tier, identifiers);
    }
    ExitCode::from(EXIT_SUCCESS)
}
