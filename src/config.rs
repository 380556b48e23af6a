use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::Map;
use crate::cli::Options;

/// Provenance tag: where a piece of lexical evidence came from.
///
/// Closed enum. Adding a source is a new variant plus a row in the two
/// default tables below; removing one is a breaking change for every
/// artifact on disk.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    IoWiktionary,
    EoWiktionary,
    IoWikipedia,
    FrWiktionaryVia,
    FrWiktionaryMeaning,
    EnWiktionaryVia,
    Wikidata,
}

impl Source {
    pub const ALL: [Self; 7] = [
        Self::IoWiktionary,
        Self::EoWiktionary,
        Self::IoWikipedia,
        Self::FrWiktionaryVia,
        Self::FrWiktionaryMeaning,
        Self::EnWiktionaryVia,
        Self::Wikidata,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IoWiktionary => "io_wiktionary",
            Self::EoWiktionary => "eo_wiktionary",
            Self::IoWikipedia => "io_wikipedia",
            Self::FrWiktionaryVia => "fr_wiktionary_via",
            Self::FrWiktionaryMeaning => "fr_wiktionary_meaning",
            Self::EnWiktionaryVia => "en_wiktionary_via",
            Self::Wikidata => "wikidata",
        }
    }

    /// Confidence a translation gets when this source does not supply one.
    pub const fn default_confidence(self) -> f64 {
        match self {
            Self::IoWiktionary | Self::EoWiktionary => 1.0,
            Self::IoWikipedia => 0.9,
            Self::EnWiktionaryVia => 0.8,
            Self::FrWiktionaryVia | Self::FrWiktionaryMeaning => 0.7,
            Self::Wikidata => 0.6,
        }
    }

    /// Conflict-resolution priority for single-valued fields. Higher wins.
    pub const fn default_priority(self) -> u32 {
        match self {
            Self::IoWiktionary => 100,
            Self::EoWiktionary => 90,
            Self::IoWikipedia => 50,
            Self::EnWiktionaryVia => 40,
            Self::FrWiktionaryMeaning => 35,
            Self::FrWiktionaryVia => 30,
            Self::Wikidata => 20,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Source {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for source in Self::ALL {
            if source.as_str() == s {
                return Ok(source);
            }
        }
        bail!(
            "unknown source '{s}'. Choose between: {}",
            Self::ALL.map(|s| s.as_str()).join(" | ")
        )
    }
}

/// Source priorities, confidences and enablement, resolved from the defaults
/// plus CLI overrides. Passed explicitly through the pipeline; there is no
/// module-level registry.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    disabled: Vec<Source>,
    priority: Map<Source, u32>,
    confidence: Map<Source, f64>,
    /// Frequency-gate threshold for Wikipedia-only entries.
    pub wiki_top_n: usize,
    /// Page-log cadence for the streaming readers.
    pub progress_every: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            priority: Map::default(),
            confidence: Map::default(),
            wiki_top_n: 1000,
            progress_every: 10_000,
        }
    }
}

impl SourceConfig {
    pub fn from_options(opts: &Options) -> Self {
        Self {
            disabled: opts.disable_source.clone(),
            priority: opts.priority.iter().copied().collect(),
            confidence: opts.confidence.iter().copied().collect(),
            wiki_top_n: opts.top_n,
            progress_every: opts.progress_every,
        }
    }

    pub fn is_enabled(&self, source: Source) -> bool {
        !self.disabled.contains(&source)
    }

    pub fn disable(&mut self, source: Source) {
        if !self.disabled.contains(&source) {
            self.disabled.push(source);
        }
    }

    pub fn priority(&self, source: Source) -> u32 {
        self.priority
            .get(&source)
            .copied()
            .unwrap_or_else(|| source.default_priority())
    }

    pub fn confidence(&self, source: Source) -> f64 {
        self.confidence
            .get(&source)
            .copied()
            .unwrap_or_else(|| source.default_confidence())
            .clamp(0.0, 1.0)
    }

    /// Max confidence over a set of contributing sources. No averaging, so
    /// repeated merges cannot drift.
    pub fn aggregate_confidence<'a>(&self, sources: impl IntoIterator<Item = &'a Source>) -> f64 {
        sources
            .into_iter()
            .map(|&s| self.confidence(s))
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_roundtrip() {
        for source in Source::ALL {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert!("de_wiktionary".parse::<Source>().is_err());
    }

    #[test]
    fn defaults_match_table() {
        assert_eq!(Source::IoWiktionary.default_confidence(), 1.0);
        assert_eq!(Source::EnWiktionaryVia.default_confidence(), 0.8);
        assert_eq!(Source::FrWiktionaryMeaning.default_priority(), 35);
        assert!(Source::FrWiktionaryMeaning.default_priority() > Source::FrWiktionaryVia.default_priority());
    }

    #[test]
    fn overrides_win() {
        let mut cfg = SourceConfig::default();
        cfg.confidence.insert(Source::Wikidata, 0.95);
        cfg.priority.insert(Source::Wikidata, 110);
        assert_eq!(cfg.confidence(Source::Wikidata), 0.95);
        assert_eq!(cfg.priority(Source::Wikidata), 110);
        assert_eq!(cfg.confidence(Source::IoWikipedia), 0.9);
    }

    #[test]
    fn aggregate_is_max() {
        let cfg = SourceConfig::default();
        let sources = [Source::EnWiktionaryVia, Source::IoWiktionary];
        assert_eq!(cfg.aggregate_confidence(sources.iter()), 1.0);
    }
}
