use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mdmerge::config::normalize_extensions;
use mdmerge::{InputSource, MergeConfig, MergeOptions, Settings};

#[derive(Debug, Parser)]
#[clap(author, version)]
#[command(group(ArgGroup::new("input").required(true).args(["files", "directory"])))]
/// Merges text files into a single file
struct Args {
    /// input files, merged in the given order
    #[arg(short, long, num_args = 1..)]
    files: Vec<PathBuf>,

    /// directory to scan recursively, files are merged in path order
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// output file
    #[arg(short, long)]
    output: PathBuf,

    /// do not insert separators between files
    #[arg(long, overrides_with = "separators")]
    no_separators: bool,

    /// insert separators between files, even if the settings file turns them off
    #[arg(long, overrides_with = "no_separators")]
    separators: bool,

    /// overwrite the output file if it exists
    #[arg(long)]
    force: bool,

    /// separator line, `{name}` and `{path}` name the file that follows
    #[arg(long)]
    separator: Option<String>,

    /// write a source header before each file
    #[arg(long)]
    headers: bool,

    /// file extension picked up by directory scans (repeatable, default md)
    #[arg(short, long)]
    ext: Vec<String>,

    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// log every file
    #[arg(short, long)]
    verbose: bool,

    /// no progress bar and no summary
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Args {
    fn init_logging(&self) {
        let level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    fn merge_config(&self) -> Result<MergeConfig> {
        let settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };

        let mut options = MergeOptions::default();
        settings.apply(&mut options);
        if let Some(separator) = &self.separator {
            options.separator = separator.clone();
        }
        if self.headers {
            options.headers = true;
        }
        if !self.ext.is_empty() {
            options.extensions = normalize_extensions(&self.ext);
        }

        let input = match &self.directory {
            Some(dir) => InputSource::Directory(dir.clone()),
            None => InputSource::Files(self.files.clone()),
        };

        Ok(MergeConfig {
            input,
            output: self.output.clone(),
            separators: match (self.separators, self.no_separators) {
                (true, _) => true,
                (_, true) => false,
                _ => settings.separators.unwrap_or(true),
            },
            force: self.force,
            options,
            progress: !self.quiet,
        })
    }

    fn run(&self) -> Result<()> {
        let config = self.merge_config()?;
        let result = mdmerge::merge(&config)
            .with_context(|| format!("unable to merge into {:?}", self.output))?;

        if !self.quiet {
            println!(
                "Merged {} files into {:?} ({} bytes)",
                result.files_merged, result.output, result.bytes_written
            );
            for path in result.skipped.iter() {
                println!("  skipped empty file {path:?}");
            }
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    args.init_logging();
    args.run()
}
