use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Source;

#[derive(Debug, Parser)]
#[command(version, about = "Rebuild Ido and Ido-Esperanto dictionaries from MediaWiki dumps")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the extraction pipeline (resumes from cached stages)
    Run(RunArgs),

    /// Show the per-stage status table
    Status(StatusArgs),

    /// Delete work artifacts and the state file
    Clean(CleanArgs),
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub options: Options,
}

#[derive(Parser, Debug, Default)]
pub struct StatusArgs {
    /// Change the root directory
    #[arg(long, default_value = "data")]
    pub root_dir: PathBuf,
}

#[derive(Parser, Debug, Default)]
pub struct CleanArgs {
    /// Change the root directory
    #[arg(long, default_value = "data")]
    pub root_dir: PathBuf,

    /// Also delete the generated dictionaries and reports
    #[arg(long)]
    pub all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct Options {
    /// Change the root directory
    #[arg(long, default_value = "data")]
    pub root_dir: PathBuf,

    /// Rerun every stage, ignoring cached artifacts
    #[arg(long, short)]
    pub force: bool,

    /// Rerun this stage and everything downstream of it
    #[arg(long)]
    pub from_stage: Option<String>,

    /// Frequency-gate threshold for Wikipedia-only entries
    #[arg(long, default_value_t = 1000)]
    pub top_n: usize,

    /// Page-log cadence of the streaming readers
    #[arg(long, default_value_t = 10_000)]
    pub progress_every: u64,

    // You can specify this option multiple times:
    //   `--disable-source en_wiktionary_via --disable-source wikidata`
    //
    /// Exclude a source from the merge
    #[arg(long = "disable-source", value_parser = parse_source)]
    pub disable_source: Vec<Source>,

    // Example:
    //   `--confidence io_wikipedia,0.8`
    //
    /// Override a source's default confidence
    #[arg(long, value_parser = parse_source_confidence)]
    pub confidence: Vec<(Source, f64)>,

    // Example:
    //   `--priority wikidata,95`
    //
    /// Override a source's default priority
    #[arg(long, value_parser = parse_source_priority)]
    pub priority: Vec<(Source, u32)>,

    /// Write jsons with whitespace
    #[arg(short, long)]
    pub pretty: bool,

    /// Suppress console progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("data"),
            force: false,
            from_stage: None,
            top_n: 1000,
            progress_every: 10_000,
            disable_source: Vec::new(),
            confidence: Vec::new(),
            priority: Vec::new(),
            pretty: false,
            quiet: false,
        }
    }
}

fn parse_source(s: &str) -> Result<Source, String> {
    s.parse::<Source>().map_err(|e| e.to_string())
}

fn split_tuple(s: &str) -> Result<(Source, &str), String> {
    let Some((source, value)) = s.split_once(',') else {
        return Err("expected two comma-separated values".into());
    };
    Ok((parse_source(source.trim())?, value.trim()))
}

fn parse_source_confidence(s: &str) -> Result<(Source, f64), String> {
    let (source, value) = split_tuple(s)?;
    let confidence: f64 = value.parse().map_err(|_| format!("bad confidence '{value}'"))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(format!("confidence {confidence} outside [0, 1]"));
    }
    Ok((source, confidence))
}

fn parse_source_priority(s: &str) -> Result<(Source, u32), String> {
    let (source, value) = split_tuple(s)?;
    let priority: u32 = value.parse().map_err(|_| format!("bad priority '{value}'"))?;
    Ok((source, priority))
}

impl Cli {
    pub fn parse_cli() -> Self {
        Self::parse()
    }
}
