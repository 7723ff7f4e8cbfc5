// Copyright 2015 Ted Mielczarek. See the COPYRIGHT
// file at the top-level directory of this distribution.

//! Command-line surface (C9 argument shape).
//!
//! This is the one piece of configuration in the whole workspace; there is
//! no config file. `CliArgs` is parsed once, at process start, and never
//! serialized — it has no `Serialize` impl because it isn't part of the
//! analysis artifact.

use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "kdump-analyze",
    about = "Analyze a Windows kernel crash dump (.dmp) file and package the result."
)]
pub struct CliArgs {
    /// Path to the .dmp file to analyze.
    #[structopt(parse(from_os_str))]
    pub dump_path: PathBuf,

    /// Directory to write the analysis archive into. Defaults to the dump
    /// file's own directory.
    #[structopt(long, parse(from_os_str))]
    pub output_dir: Option<PathBuf>,

    /// Run the analysis and print the text summary without writing a .zip
    /// archive.
    #[structopt(long)]
    pub no_archive: bool,

    /// Increase logging verbosity. Repeatable: warn -> info -> debug -> trace.
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: u8,

    /// Suppress all logging below error.
    #[structopt(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Resolve the `log::LevelFilter` implied by `--verbose`/`--quiet`.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    /// The directory the archive should be written into.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            self.dump_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_steps_through_levels() {
        let mut args = CliArgs::from_iter(&["kdump-analyze", "a.dmp"]);
        assert_eq!(args.log_level(), log::LevelFilter::Warn);
        args.verbose = 1;
        assert_eq!(args.log_level(), log::LevelFilter::Info);
        args.verbose = 2;
        assert_eq!(args.log_level(), log::LevelFilter::Debug);
        args.verbose = 3;
        assert_eq!(args.log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn quiet_overrides_verbose() {
        let mut args = CliArgs::from_iter(&["kdump-analyze", "a.dmp"]);
        args.verbose = 3;
        args.quiet = true;
        assert_eq!(args.log_level(), log::LevelFilter::Error);
    }

    #[test]
    fn output_dir_defaults_to_dump_parent() {
        let args = CliArgs::from_iter(&["kdump-analyze", "/tmp/dumps/crash.dmp"]);
        assert_eq!(args.resolved_output_dir(), PathBuf::from("/tmp/dumps"));
    }

    #[test]
    fn output_dir_honors_explicit_flag() {
        let args = CliArgs::from_iter(&[
            "kdump-analyze",
            "/tmp/dumps/crash.dmp",
            "--output-dir",
            "/tmp/out",
        ]);
        assert_eq!(args.resolved_output_dir(), PathBuf::from("/tmp/out"));
    }
}
