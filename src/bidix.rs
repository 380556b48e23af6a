//! Surface-entry expansion: the bilingual Ido→Esperanto dictionary and the
//! monolingual Ido dictionary.

use crate::Map;
use crate::lang::Lang;
use crate::models::bidix::{BidixEntry, MonodixEntry};
use crate::models::entry::Entry;
use crate::morph::Paradigm;

/// Expand merged, morphologized entries into bilingual surface entries: one
/// per distinct `(lemma, EO term)`. A term attested by several senses comes
/// out once, with the union of its sources. Output is sorted by `(lemma,
/// translation)` and stable for the same input.
pub fn build_bidix(entries: &[Entry]) -> Vec<BidixEntry> {
    let mut surface: Map<(String, String), BidixEntry> = Map::default();

    for entry in entries {
        if entry.language != Lang::Io {
            continue;
        }
        let paradigm = entry.morphology.unwrap_or(Paradigm::Unknown);
        let translation_paradigm = Paradigm::default_for_eo(entry.pos);

        for sense in &entry.senses {
            for tr in &sense.translations {
                if tr.lang != Lang::Eo {
                    continue;
                }
                let key = (entry.lemma.clone(), tr.term.clone());
                surface
                    .entry(key)
                    .and_modify(|existing| {
                        existing.sources.extend(tr.sources.iter().copied());
                    })
                    .or_insert_with(|| BidixEntry {
                        lemma: entry.lemma.clone(),
                        paradigm,
                        translation: tr.term.clone(),
                        translation_paradigm,
                        sources: tr.sources.clone(),
                    });
            }
        }
    }

    let mut entries: Vec<BidixEntry> = surface.into_values().collect();
    entries.sort_by(|a, b| (&a.lemma, &a.translation).cmp(&(&b.lemma, &b.translation)));
    entries
}

/// The monolingual Ido dictionary: one row per merged IO entry, lemma plus
/// paradigm, sorted by `(lemma, pos)`.
pub fn build_monodix(entries: &[Entry]) -> Vec<MonodixEntry> {
    let mut rows: Vec<MonodixEntry> = entries
        .iter()
        .filter(|e| e.language == Lang::Io)
        .map(|e| MonodixEntry {
            lemma: e.lemma.clone(),
            pos: e.pos,
            paradigm: e.morphology.unwrap_or(Paradigm::Unknown),
        })
        .collect();
    rows.sort_by(|a, b| (&a.lemma, a.pos).cmp(&(&b.lemma, b.pos)));
    rows.dedup();
    rows
}
