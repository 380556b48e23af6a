//! Post-merge filtering: schema enforcement, the Wikipedia frequency gate,
//! and duplicate removal.

use serde::{Deserialize, Serialize};

use crate::Map;
use crate::Set;
use crate::clean::is_valid_lemma_exempt;
use crate::config::Source;
use crate::lang::{Lang, Pos};
use crate::models::entry::Entry;

/// Why entries were dropped, for the statistics report. Every dropped entry
/// lands in exactly one of these.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FilterStats {
    pub invalid_schema: u64,
    pub below_frequency_gate: u64,
    pub duplicates: u64,
    pub kept: u64,
}

fn violates_schema(entry: &Entry) -> bool {
    if entry.lemma.is_empty() {
        return true;
    }
    // proper nouns from organizations may be acronyms; everything else
    // must satisfy the plain validator
    let allow_acronym = entry.pos == Pos::ProperNoun;
    if !is_valid_lemma_exempt(&entry.lemma, allow_acronym) {
        return true;
    }
    if entry.provenance.is_empty() {
        return true;
    }
    for sense in &entry.senses {
        for tr in &sense.translations {
            if tr.term.is_empty() || tr.sources.is_empty() {
                return true;
            }
            if !(0.0..=1.0).contains(&tr.confidence) {
                return true;
            }
        }
    }
    false
}

/// Apply all three filters in order. `top_words` is the top-N slice of the
/// Wikipedia token-frequency table (already limited to N).
pub fn filter_entries(
    entries: Vec<Entry>,
    top_words: &Set<String>,
    stats: &mut FilterStats,
) -> Vec<Entry> {
    let mut seen: Map<(Lang, String, Pos, Vec<(Lang, String)>), ()> = Map::default();
    let mut kept = Vec::with_capacity(entries.len());

    for entry in entries {
        if violates_schema(&entry) {
            stats.invalid_schema += 1;
            continue;
        }

        // entries supported only by the Ido Wikipedia must either be proper
        // nouns or sit inside the frequency window
        if entry.only_from(Source::IoWikipedia)
            && !entry.is_proper_noun()
            && !top_words.contains(&entry.lemma.to_lowercase())
        {
            stats.below_frequency_gate += 1;
            continue;
        }

        let identity = (
            entry.language,
            entry.key_lemma(),
            entry.pos,
            entry.translation_term_set(),
        );
        if seen.contains_key(&identity) {
            stats.duplicates += 1;
            continue;
        }
        seen.insert(identity, ());

        stats.kept += 1;
        kept.push(entry);
    }
    kept
}
