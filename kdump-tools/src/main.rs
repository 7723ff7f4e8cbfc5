// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! `kdump-analyze`: the command-line front-end (C9).
//!
//! Parses arguments, initializes the one concrete logger in this whole
//! workspace, drives [`kdump_processor::DumpAnalyzer`] and then
//! (conditionally) [`archive::write_archive`], and maps the outcome to a
//! process exit code.

mod archive;
mod cli;
mod summary;

use kdump_processor::DumpAnalyzer;
use std::process::ExitCode;
use structopt::StructOpt;

fn main() -> ExitCode {
    let args = cli::CliArgs::from_args();

    env_logger::Builder::new()
        .filter(None, args.log_level())
        .init();

    log::info!("kdump-analyze starting for {}", args.dump_path.display());
    let analysis = DumpAnalyzer::analyze(&args.dump_path);

    if !analysis.success {
        let message = analysis
            .error
            .unwrap_or_else(|| "analysis failed for an unknown reason".to_string());
        log::error!("{}", message);
        eprintln!("{}", message);
        return ExitCode::from(1);
    }

    println!("{}", summary::render(&analysis));

    if args.no_archive {
        log::info!("--no-archive given, skipping archive write");
        return ExitCode::from(0);
    }

    let output_dir = args.resolved_output_dir();
    let timestamp = chrono::Local::now();
    match archive::write_archive(&analysis, &args.dump_path, &output_dir, timestamp) {
        Ok(path) => {
            println!("Archive written to {}", path.display());
            ExitCode::from(0)
        }
        Err(e) => {
            log::error!("failed to write archive: {}", e);
            eprintln!("Failed to write archive: {}", e);
            ExitCode::from(2)
        }
    }
}
