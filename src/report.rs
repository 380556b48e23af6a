//! Human-readable audit reports: statistics, coverage, conflicts.
//!
//! Counting contract: every entry of the final output lands exactly once in
//! each applicable table, every dropped entry in at least one rejection
//! category (parser drops, cleaner rejections, filter drops).

use std::fmt::Write as _;

use crate::Map;
use crate::Set;
use crate::config::Source;
use crate::filter::FilterStats;
use crate::lang::Pos;
use crate::merge::ConflictLog;
use crate::models::entry::Entry;
use crate::morph::Paradigm;
use crate::wikt::ParseStats;

pub fn statistics_report(
    entries: &[Entry],
    parse_stats: &[(String, ParseStats)],
    filter_stats: &FilterStats,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "STATISTICS");
    let _ = writeln!(out, "==========");
    let _ = writeln!(out);
    let _ = writeln!(out, "final entries: {}", entries.len());
    let _ = writeln!(out);

    let _ = writeln!(out, "entries by source");
    let _ = writeln!(out, "-----------------");
    for source in Source::ALL {
        let count = entries
            .iter()
            .filter(|e| e.provenance.contains(&source))
            .count();
        if count > 0 {
            let _ = writeln!(out, "{:<24} {count}", source.as_str());
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "entries by part of speech");
    let _ = writeln!(out, "-------------------------");
    let mut by_pos: Map<Pos, usize> = Map::default();
    for entry in entries {
        *by_pos.entry(entry.pos).or_default() += 1;
    }
    let mut by_pos: Vec<_> = by_pos.into_iter().collect();
    by_pos.sort();
    for (pos, count) in by_pos {
        let _ = writeln!(out, "{:<24} {count}", pos.as_str());
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "entries by paradigm");
    let _ = writeln!(out, "-------------------");
    let mut by_paradigm: Map<Paradigm, usize> = Map::default();
    for entry in entries {
        *by_paradigm
            .entry(entry.morphology.unwrap_or(Paradigm::Unknown))
            .or_default() += 1;
    }
    let mut by_paradigm: Vec<_> = by_paradigm.into_iter().collect();
    by_paradigm.sort();
    for (paradigm, count) in by_paradigm {
        let _ = writeln!(out, "{:<24} {count}", paradigm.as_str());
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "extraction");
    let _ = writeln!(out, "----------");
    let mut totals = ParseStats::default();
    for (stage, stats) in parse_stats {
        totals.absorb(stats);
        let _ = writeln!(
            out,
            "{stage}: {} pages seen, {} matched, {} entries, \
             {} parse errors, {} lemmas rejected, {} terms dropped",
            stats.pages_seen,
            stats.pages_matched,
            stats.entries_emitted,
            stats.parse_errors,
            stats.clean.rejected_lemmas,
            stats.clean.dropped_terms,
        );
    }
    let _ = writeln!(
        out,
        "total: {} pages seen, {} entries, {} parse errors, \
         {} lemmas rejected, {} terms dropped",
        totals.pages_seen,
        totals.entries_emitted,
        totals.parse_errors,
        totals.clean.rejected_lemmas,
        totals.clean.dropped_terms,
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "filtering");
    let _ = writeln!(out, "---------");
    let _ = writeln!(out, "invalid schema          {}", filter_stats.invalid_schema);
    let _ = writeln!(out, "below frequency gate    {}", filter_stats.below_frequency_gate);
    let _ = writeln!(out, "duplicates removed      {}", filter_stats.duplicates);
    let _ = writeln!(out, "kept                    {}", filter_stats.kept);

    out
}

pub fn coverage_report(entries: &[Entry], top_words: &Set<String>) -> String {
    let lemmas: Set<String> = entries.iter().map(|e| e.lemma.to_lowercase()).collect();

    let covered = top_words.iter().filter(|w| lemmas.contains(*w)).count();
    let missing: Vec<&String> = top_words.iter().filter(|w| !lemmas.contains(*w)).collect();

    let mut out = String::new();
    let _ = writeln!(out, "COVERAGE");
    let _ = writeln!(out, "========");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "top-{} frequency words covered: {covered} ({:.1}%)",
        top_words.len(),
        if top_words.is_empty() {
            100.0
        } else {
            100.0 * covered as f64 / top_words.len() as f64
        }
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "missing high-frequency lemmas (first 50)");
    let _ = writeln!(out, "----------------------------------------");
    for word in missing.iter().take(50) {
        let _ = writeln!(out, "{word}");
    }
    out
}

pub fn conflicts_report(log: &ConflictLog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "CONFLICTS");
    let _ = writeln!(out, "=========");
    let _ = writeln!(out);

    let _ = writeln!(out, "POS conflicts: {}", log.pos_conflicts.len());
    for conflict in &log.pos_conflicts {
        let poses: Vec<&str> = conflict.poses.iter().map(|p| p.as_str()).collect();
        let _ = writeln!(
            out,
            "  {} ({}): {}",
            conflict.lemma,
            conflict.language,
            poses.join(" / ")
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "paradigm conflicts: {}", log.paradigm_conflicts.len());
    for conflict in &log.paradigm_conflicts {
        let rejected: Vec<&str> = conflict.rejected.iter().map(|p| p.as_str()).collect();
        let _ = writeln!(
            out,
            "  {} ({}, {}): kept {}, rejected {}",
            conflict.lemma,
            conflict.language,
            conflict.pos,
            conflict.chosen.as_str(),
            rejected.join(" / ")
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "duplicate translations merged: {}",
        log.duplicate_translations
    );
    out
}
