//! Alignment and multi-source merging.
//!
//! The aligner turns every piece of evidence into an IO-headed entry; the
//! merger then collapses entries by `(language, lemma, pos)` with unioned
//! provenance, collapsed senses and deterministic conflict resolution.

use serde::{Deserialize, Serialize};

use crate::Map;
use crate::Set;
use crate::config::SourceConfig;
use crate::lang::{Lang, Pos};
use crate::models::entry::{Entry, Sense, Translation};
use crate::morph::Paradigm;

/// Flip EO-headed entries into IO-headed ones: each Ido translation of an
/// Esperanto lemma becomes an Ido entry translating back to that lemma.
/// IO-headed entries pass through untouched; EO entries without Ido
/// translations have nothing to contribute and are dropped.
pub fn align_entries(entries: Vec<Entry>) -> Vec<Entry> {
    let mut aligned = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.language {
            Lang::Io => aligned.push(entry),
            Lang::Eo => {
                for sense in &entry.senses {
                    for tr in &sense.translations {
                        if tr.lang != Lang::Io {
                            continue;
                        }
                        let mut flipped = Entry {
                            lemma: tr.term.clone(),
                            language: Lang::Io,
                            pos: entry.pos,
                            provenance: entry.provenance.clone(),
                            ..Default::default()
                        };
                        flipped.senses.push(Sense {
                            sense_id: sense.sense_id.clone(),
                            gloss: sense.gloss.clone(),
                            translations: vec![Translation {
                                term: entry.lemma.clone(),
                                lang: Lang::Eo,
                                confidence: tr.confidence,
                                sources: tr.sources.clone(),
                            }],
                        });
                        aligned.push(flipped);
                    }
                }
            }
        }
    }
    aligned
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PosConflict {
    pub language: Lang,
    pub lemma: String,
    pub poses: Vec<Pos>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParadigmConflict {
    pub language: Lang,
    pub lemma: String,
    pub pos: Pos,
    pub chosen: Paradigm,
    pub rejected: Vec<Paradigm>,
}

/// Audit record of everything the merger decided instead of silently fixing.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ConflictLog {
    pub pos_conflicts: Vec<PosConflict>,
    pub paradigm_conflicts: Vec<ParadigmConflict>,
    pub duplicate_translations: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    language: Lang,
    lemma: String,
    pos: Pos,
}

/// A paradigm candidate with the priority of its best contributing source.
#[derive(Debug, Clone, Copy)]
struct ParadigmVote {
    paradigm: Paradigm,
    priority: u32,
}

struct Bucket {
    entry: Entry,
    votes: Vec<ParadigmVote>,
}

fn entry_priority(entry: &Entry, cfg: &SourceConfig) -> u32 {
    entry
        .provenance
        .iter()
        .map(|&s| cfg.priority(s))
        .max()
        .unwrap_or(0)
}

/// Canonical casing for a translation term: lowercase for common entries,
/// contributor casing for proper-noun-derived ones.
fn canonical_term(term: &str, entry_is_proper: bool) -> String {
    if entry_is_proper {
        term.to_string()
    } else {
        term.to_lowercase()
    }
}

fn merge_translations_into(
    sense: &mut Sense,
    incoming: Vec<Translation>,
    entry_is_proper: bool,
    cfg: &SourceConfig,
    log: &mut ConflictLog,
) {
    for tr in incoming {
        let term = canonical_term(&tr.term, entry_is_proper);
        let existing = sense
            .translations
            .iter_mut()
            .find(|t| t.lang == tr.lang && t.term == term);
        match existing {
            Some(t) => {
                log.duplicate_translations += 1;
                t.sources.extend(tr.sources.iter().copied());
                t.confidence = cfg.aggregate_confidence(t.sources.iter());
            }
            None => {
                let mut tr = tr;
                tr.term = term;
                tr.confidence = cfg.aggregate_confidence(tr.sources.iter());
                sense.translations.push(tr);
            }
        }
    }
}

fn merge_entry_into(bucket: &mut Bucket, entry: Entry, cfg: &SourceConfig, log: &mut ConflictLog) {
    let priority = entry_priority(&entry, cfg);
    let is_proper = bucket.entry.is_proper_noun();

    bucket.entry.provenance.extend(entry.provenance.iter().copied());

    if bucket.entry.original_lemma.is_none() {
        bucket.entry.original_lemma = entry.original_lemma;
    }
    if let Some(paradigm) = entry.morphology {
        bucket.votes.push(ParadigmVote { paradigm, priority });
    }

    for sense in entry.senses {
        let signature = sense.signature();
        let existing = bucket
            .entry
            .senses
            .iter_mut()
            .find(|s| s.signature() == signature);
        match existing {
            Some(s) => {
                merge_translations_into(s, sense.translations, is_proper, cfg, log);
            }
            None => {
                let mut fresh = Sense {
                    sense_id: sense.sense_id,
                    gloss: sense.gloss,
                    translations: Vec::new(),
                };
                merge_translations_into(&mut fresh, sense.translations, is_proper, cfg, log);
                bucket.entry.senses.push(fresh);
            }
        }
    }
}

fn resolve_paradigm(bucket: &mut Bucket, log: &mut ConflictLog) {
    if bucket.votes.is_empty() {
        return;
    }

    let mut distinct: Vec<Paradigm> = Vec::new();
    for vote in &bucket.votes {
        if !distinct.contains(&vote.paradigm) {
            distinct.push(vote.paradigm);
        }
    }

    // highest source priority wins; ties break on the lexicographic id
    let best = bucket
        .votes
        .iter()
        .max_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| b.paradigm.as_str().cmp(a.paradigm.as_str()))
        })
        .map(|vote| vote.paradigm);
    bucket.entry.morphology = best;

    if distinct.len() > 1 {
        let chosen = best.unwrap_or(Paradigm::Unknown);
        log.paradigm_conflicts.push(ParadigmConflict {
            language: bucket.entry.language,
            lemma: bucket.entry.lemma.clone(),
            pos: bucket.entry.pos,
            chosen,
            rejected: distinct.into_iter().filter(|p| *p != chosen).collect(),
        });
    }
}

/// Deterministic multi-source merge. Output is sorted by `(language,
/// lemma)`, senses keep first-seen order, translations within a sense are
/// sorted by `(lang, term)`. Merging is idempotent.
pub fn merge_entries(entries: Vec<Entry>, cfg: &SourceConfig) -> (Vec<Entry>, ConflictLog) {
    let mut log = ConflictLog::default();
    let mut buckets: Map<BucketKey, Bucket> = Map::default();

    for entry in entries {
        let key = BucketKey {
            language: entry.language,
            lemma: entry.key_lemma(),
            pos: entry.pos,
        };
        match buckets.get_mut(&key) {
            Some(bucket) => merge_entry_into(bucket, entry, cfg, &mut log),
            None => {
                let mut bucket = Bucket {
                    entry: Entry {
                        senses: Vec::new(),
                        morphology: None,
                        original_lemma: None,
                        ..entry.clone()
                    },
                    votes: Vec::new(),
                };
                // run the first contributor through the same path as the rest
                merge_entry_into(&mut bucket, entry, cfg, &mut log);
                buckets.insert(key, bucket);
            }
        }
    }

    // same lemma, same language, different POS: keep apart, record
    let mut by_lemma: Map<(Lang, String), Set<Pos>> = Map::default();
    for key in buckets.keys() {
        by_lemma
            .entry((key.language, key.lemma.to_lowercase()))
            .or_default()
            .insert(key.pos);
    }
    for ((language, lemma), poses) in &by_lemma {
        // `unknown` is a pre-inference placeholder, not a conflicting claim
        let mut poses: Vec<Pos> = poses
            .iter()
            .copied()
            .filter(|p| *p != Pos::Unknown)
            .collect();
        if poses.len() > 1 {
            poses.sort();
            log.pos_conflicts.push(PosConflict {
                language: *language,
                lemma: lemma.clone(),
                poses,
            });
        }
    }
    log.pos_conflicts
        .sort_by(|a, b| (a.language, &a.lemma).cmp(&(b.language, &b.lemma)));

    let mut merged: Vec<Entry> = buckets
        .into_values()
        .map(|mut bucket| {
            resolve_paradigm(&mut bucket, &mut log);
            for sense in &mut bucket.entry.senses {
                sense
                    .translations
                    .sort_by(|a, b| (a.lang, &a.term).cmp(&(b.lang, &b.term)));
            }
            bucket.entry
        })
        .collect();
    merged.sort_by(|a, b| {
        (a.language, &a.lemma, a.pos).cmp(&(b.language, &b.lemma, b.pos))
    });
    log.paradigm_conflicts
        .sort_by(|a, b| (a.language, &a.lemma).cmp(&(b.language, &b.lemma)));

    (merged, log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Source;

    fn io_entry(lemma: &str, pos: Pos, source: Source, terms: &[&str]) -> Entry {
        let mut entry = Entry::new(lemma, Lang::Io, pos, source);
        if !terms.is_empty() {
            entry.senses.push(Sense {
                sense_id: None,
                gloss: None,
                translations: terms
                    .iter()
                    .map(|t| {
                        Translation::attested(*t, Lang::Eo, source, source.default_confidence())
                    })
                    .collect(),
            });
        }
        entry
    }

    fn eo_entry(lemma: &str, pos: Pos, source: Source, io_terms: &[&str]) -> Entry {
        let mut entry = Entry::new(lemma, Lang::Eo, pos, source);
        entry.senses.push(Sense {
            sense_id: None,
            gloss: None,
            translations: io_terms
                .iter()
                .map(|t| Translation::attested(*t, Lang::Io, source, source.default_confidence()))
                .collect(),
        });
        entry
    }

    #[test]
    fn aligner_flips_eo_entries() {
        let entries = vec![eo_entry("seĝo", Pos::Noun, Source::EoWiktionary, &["stulo"])];
        let aligned = align_entries(entries);
        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned[0].lemma, "stulo");
        assert_eq!(aligned[0].language, Lang::Io);
        assert_eq!(aligned[0].senses[0].translations[0].term, "seĝo");
        assert_eq!(aligned[0].senses[0].translations[0].lang, Lang::Eo);
        assert!(aligned[0].provenance.contains(&Source::EoWiktionary));
    }

    #[test]
    fn multi_source_translation_union() {
        let cfg = SourceConfig::default();
        let entries = vec![
            io_entry("banko", Pos::Noun, Source::IoWiktionary, &["banko"]),
            io_entry("banko", Pos::Noun, Source::EnWiktionaryVia, &["banko"]),
        ];
        let (merged, log) = merge_entries(entries, &cfg);
        assert_eq!(merged.len(), 1);
        let tr = &merged[0].senses[0].translations[0];
        assert_eq!(tr.term, "banko");
        assert!(tr.sources.contains(&Source::IoWiktionary));
        assert!(tr.sources.contains(&Source::EnWiktionaryVia));
        assert_eq!(tr.confidence, 1.0);
        assert_eq!(log.duplicate_translations, 1);
        assert!(merged[0].provenance.contains(&Source::EnWiktionaryVia));
    }

    #[test]
    fn pos_conflict_kept_and_reported() {
        let cfg = SourceConfig::default();
        let entries = vec![
            io_entry("stulo", Pos::Noun, Source::IoWiktionary, &["seĝo"]),
            io_entry("stulo", Pos::ProperNoun, Source::IoWikipedia, &[]),
        ];
        let (merged, log) = merge_entries(entries, &cfg);
        assert_eq!(merged.len(), 2);
        assert_eq!(log.pos_conflicts.len(), 1);
        assert_eq!(log.pos_conflicts[0].lemma, "stulo");
        assert_eq!(log.pos_conflicts[0].poses, vec![Pos::Noun, Pos::ProperNoun]);
    }

    #[test]
    fn merge_is_idempotent() {
        let cfg = SourceConfig::default();
        let entries = vec![
            io_entry("banko", Pos::Noun, Source::IoWiktionary, &["banko", "monbanko"]),
            io_entry("banko", Pos::Noun, Source::EnWiktionaryVia, &["banko"]),
            io_entry("stulo", Pos::Noun, Source::IoWiktionary, &["seĝo"]),
        ];
        let (once, _) = merge_entries(entries, &cfg);
        let (twice, _) = merge_entries(once.clone(), &cfg);
        let a = serde_json::to_string(&once).unwrap();
        let b = serde_json::to_string(&twice).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn case_only_difference_canonicalizes() {
        let cfg = SourceConfig::default();
        let entries = vec![
            io_entry("banko", Pos::Noun, Source::IoWiktionary, &["Banko"]),
            io_entry("banko", Pos::Noun, Source::EnWiktionaryVia, &["banko"]),
        ];
        let (merged, _) = merge_entries(entries, &cfg);
        assert_eq!(merged[0].senses[0].translations.len(), 1);
        assert_eq!(merged[0].senses[0].translations[0].term, "banko");
    }

    #[test]
    fn proper_noun_keeps_case() {
        let cfg = SourceConfig::default();
        let entries = vec![
            io_entry("Parizo", Pos::ProperNoun, Source::IoWikipedia, &["Parizo"]),
            io_entry("parizo", Pos::Noun, Source::IoWiktionary, &["Parizo"]),
        ];
        let (merged, _) = merge_entries(entries, &cfg);
        let proper = merged.iter().find(|e| e.pos == Pos::ProperNoun).unwrap();
        assert_eq!(proper.lemma, "Parizo");
        assert_eq!(proper.senses[0].translations[0].term, "Parizo");
        let common = merged.iter().find(|e| e.pos == Pos::Noun).unwrap();
        assert_eq!(common.senses[0].translations[0].term, "parizo");
    }

    #[test]
    fn paradigm_conflict_resolved_by_priority() {
        let cfg = SourceConfig::default();
        let mut a = io_entry("radio", Pos::Noun, Source::IoWikipedia, &[]);
        a.morphology = Some(Paradigm::NpNp);
        let mut b = io_entry("radio", Pos::Noun, Source::IoWiktionary, &["radio"]);
        b.morphology = Some(Paradigm::ONoun);
        let (merged, log) = merge_entries(vec![a, b], &cfg);
        assert_eq!(merged.len(), 1);
        // io_wiktionary has priority 100 > io_wikipedia 50
        assert_eq!(merged[0].morphology, Some(Paradigm::ONoun));
        assert_eq!(log.paradigm_conflicts.len(), 1);
        assert_eq!(log.paradigm_conflicts[0].chosen, Paradigm::ONoun);
        assert_eq!(log.paradigm_conflicts[0].rejected, vec![Paradigm::NpNp]);
    }

    #[test]
    fn sense_groups_collapse_by_signature() {
        let cfg = SourceConfig::default();
        let mut a = io_entry("abasar", Pos::Verb, Source::IoWiktionary, &[]);
        a.senses.push(Sense {
            sense_id: Some("1".into()),
            gloss: Some("madaldama".into()),
            translations: vec![Translation::attested(
                "madaldama",
                Lang::Eo,
                Source::IoWiktionary,
                1.0,
            )],
        });
        a.senses.push(Sense {
            sense_id: Some("2".into()),
            gloss: Some("malaltigi".into()),
            translations: vec![Translation::attested(
                "malaltigi",
                Lang::Eo,
                Source::IoWiktionary,
                1.0,
            )],
        });
        let b = a.clone();
        let (merged, _) = merge_entries(vec![a, b], &cfg);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].senses.len(), 2);
    }

    #[test]
    fn output_order_is_lexicographic() {
        let cfg = SourceConfig::default();
        let entries = vec![
            io_entry("zebro", Pos::Noun, Source::IoWiktionary, &["zebro"]),
            io_entry("abelo", Pos::Noun, Source::IoWiktionary, &["abelo"]),
        ];
        let (merged, _) = merge_entries(entries, &cfg);
        assert_eq!(merged[0].lemma, "abelo");
        assert_eq!(merged[1].lemma, "zebro");
    }
}
