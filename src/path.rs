use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::lang::DumpLang;

/// Helper struct to manage the artifact tree.
//
// Every stage derives its input and output paths from here, so the layout
// lives in one place and the pipeline's cache checks and the stage bodies
// can never disagree about where an artifact goes.
#[derive(Debug, Clone)]
pub struct PathManager {
    root_dir: PathBuf,
}

impl PathManager {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Example: `data/dumps`
    pub fn dir_dumps(&self) -> PathBuf {
        self.root_dir.join("dumps")
    }

    /// Example: `data/work`
    pub fn dir_work(&self) -> PathBuf {
        self.root_dir.join("work")
    }

    /// Example: `data/work/stats`
    pub fn dir_stats(&self) -> PathBuf {
        self.dir_work().join("stats")
    }

    /// Example: `data/dict`
    pub fn dir_dict(&self) -> PathBuf {
        self.root_dir.join("dict")
    }

    /// Example: `data/reports`
    pub fn dir_reports(&self) -> PathBuf {
        self.root_dir.join("reports")
    }

    pub fn setup_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.dir_dumps())?;
        fs::create_dir_all(self.dir_stats())?;
        fs::create_dir_all(self.dir_dict())?;
        fs::create_dir_all(self.dir_reports())?;
        Ok(())
    }

    /// Example: `data/state.json`
    pub fn path_state(&self) -> PathBuf {
        self.root_dir.join("state.json")
    }

    /// Example (io): `data/dumps/io-wiktionary-pages-articles.xml.bz2`
    pub fn path_wiktionary_dump(&self, dump: DumpLang) -> PathBuf {
        self.dir_dumps()
            .join(format!("{dump}-wiktionary-pages-articles.xml.bz2"))
    }

    /// Example: `data/dumps/io-wikipedia-pages-articles.xml.bz2`
    pub fn path_wikipedia_dump(&self) -> PathBuf {
        self.dir_dumps().join("io-wikipedia-pages-articles.xml.bz2")
    }

    /// Example: `data/dumps/io-wikipedia-langlinks.sql.gz`
    pub fn path_langlinks_dump(&self) -> PathBuf {
        self.dir_dumps().join("io-wikipedia-langlinks.sql.gz")
    }

    /// Per-source extraction artifact.
    ///
    /// Example (io): `data/work/io-wiktionary.jsonl`
    pub fn path_extracted(&self, dump: DumpLang) -> PathBuf {
        self.dir_work().join(format!("{dump}-wiktionary.jsonl"))
    }

    /// Example: `data/work/wikipedia-vocab.jsonl`
    pub fn path_wikipedia_vocab(&self) -> PathBuf {
        self.dir_work().join("wikipedia-vocab.jsonl")
    }

    /// Token-frequency table over the Ido Wikipedia article text.
    ///
    /// Example: `data/work/wikipedia-frequency.json`
    pub fn path_wikipedia_frequency(&self) -> PathBuf {
        self.dir_work().join("wikipedia-frequency.json")
    }

    /// Page-id to title map for resolving langlink rows.
    ///
    /// Example: `data/work/wikipedia-titles.json`
    pub fn path_wikipedia_titles(&self) -> PathBuf {
        self.dir_work().join("wikipedia-titles.json")
    }

    /// Example: `data/work/langlinks.jsonl`
    pub fn path_langlinks(&self) -> PathBuf {
        self.dir_work().join("langlinks.jsonl")
    }

    /// Example: `data/work/aligned.jsonl`
    pub fn path_aligned(&self) -> PathBuf {
        self.dir_work().join("aligned.jsonl")
    }

    /// Example: `data/work/merged.jsonl`
    pub fn path_merged(&self) -> PathBuf {
        self.dir_work().join("merged.jsonl")
    }

    /// Example: `data/work/conflicts.json`
    pub fn path_conflicts(&self) -> PathBuf {
        self.dir_work().join("conflicts.json")
    }

    /// Example: `data/work/morphology.jsonl`
    pub fn path_morphology(&self) -> PathBuf {
        self.dir_work().join("morphology.jsonl")
    }

    /// Example: `data/work/filtered.jsonl`
    pub fn path_filtered(&self) -> PathBuf {
        self.dir_work().join("filtered.jsonl")
    }

    /// Per-stage parse/clean statistics.
    ///
    /// Example: `data/work/stats/io-wiktionary.json`
    pub fn path_stats(&self, stage: &str) -> PathBuf {
        self.dir_stats().join(format!("{stage}.json"))
    }

    /// Example: `data/dict/io-eo.bidix.jsonl`
    pub fn path_bidix(&self) -> PathBuf {
        self.dir_dict().join("io-eo.bidix.jsonl")
    }

    /// Example: `data/dict/io.monodix.jsonl`
    pub fn path_monodix(&self) -> PathBuf {
        self.dir_dict().join("io.monodix.jsonl")
    }

    /// Example: `data/reports/statistics.txt`
    pub fn path_report_statistics(&self) -> PathBuf {
        self.dir_reports().join("statistics.txt")
    }

    /// Example: `data/reports/coverage.txt`
    pub fn path_report_coverage(&self) -> PathBuf {
        self.dir_reports().join("coverage.txt")
    }

    /// Example: `data/reports/conflicts.txt`
    pub fn path_report_conflicts(&self) -> PathBuf {
        self.dir_reports().join("conflicts.txt")
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }
}
