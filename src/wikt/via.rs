//! Via-pivot pairing: derive IO↔EO pairs from a third-language page that
//! lists both languages as translations of the same headword.
//!
//! Two modes with different evidence strength. Co-occurrence pairs anything
//! found anywhere on the same pivot page; same-meaning pairs only inside one
//! translation block, so it is semantically validated and carries its own
//! provenance tag. Both emit incrementally per page.

use crate::config::{Source, SourceConfig};
use crate::lang::{DumpLang, Lang, Pos};
use crate::models::entry::{Entry, Sense, Translation};
use crate::wikt::PivotPage;

fn pair_entries(
    lemma_terms: &[String],
    translation_terms: &[String],
    sense_id: String,
    gloss: Option<String>,
    tag: Source,
    cfg: &SourceConfig,
) -> Vec<Entry> {
    let confidence = cfg.confidence(tag);
    lemma_terms
        .iter()
        .map(|io_term| {
            let mut entry = Entry::new(io_term.clone(), Lang::Io, Pos::Unknown, tag);
            entry.senses.push(Sense {
                sense_id: Some(sense_id.clone()),
                gloss: gloss.clone(),
                translations: translation_terms
                    .iter()
                    .map(|eo_term| {
                        Translation::attested(eo_term.clone(), Lang::Eo, tag, confidence)
                    })
                    .collect(),
            });
            entry
        })
        .collect()
}

/// Page-level co-occurrence: every IO term on the page pairs with every EO
/// term on the page, one sense glossed by the pivot headword.
///
/// Only the English edition runs this mode. The French edition labels its
/// blocks with meanings, and pairing across its blocks would undo exactly
/// the precision the meaning mode buys.
pub fn via_cooccurrence(dump: DumpLang, page: &PivotPage, cfg: &SourceConfig) -> Vec<Entry> {
    let tag = match dump {
        DumpLang::En => Source::EnWiktionaryVia,
        DumpLang::Io | DumpLang::Eo | DumpLang::Fr => return Vec::new(),
    };
    if !cfg.is_enabled(tag) {
        return Vec::new();
    }

    let mut io_terms: Vec<String> = Vec::new();
    let mut eo_terms: Vec<String> = Vec::new();
    for block in &page.blocks {
        for term in &block.io {
            if !io_terms.contains(term) {
                io_terms.push(term.clone());
            }
        }
        for term in &block.eo {
            if !eo_terms.contains(term) {
                eo_terms.push(term.clone());
            }
        }
    }
    if io_terms.is_empty() || eo_terms.is_empty() {
        return Vec::new();
    }

    pair_entries(
        &io_terms,
        &eo_terms,
        format!("{dump}:{}", page.headword),
        Some(page.headword.clone()),
        tag,
        cfg,
    )
}

/// Block-level pairing: an IO/EO pair is only emitted when both sit inside
/// the same translation block. Pairs split across blocks of the same page
/// never pair up here.
pub fn via_meaning(page: &PivotPage, cfg: &SourceConfig) -> Vec<Entry> {
    let tag = Source::FrWiktionaryMeaning;
    if !cfg.is_enabled(tag) {
        return Vec::new();
    }

    let mut entries = Vec::new();
    for (i, block) in page.blocks.iter().enumerate() {
        if block.io.is_empty() || block.eo.is_empty() {
            continue;
        }
        entries.extend(pair_entries(
            &block.io,
            &block.eo,
            format!("fr:{}#{}", page.headword, i + 1),
            block.gloss.clone(),
            tag,
            cfg,
        ));
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikt::TransBlock;

    fn pivot(headword: &str, blocks: Vec<TransBlock>) -> PivotPage {
        PivotPage {
            headword: headword.to_string(),
            blocks,
        }
    }

    fn block(gloss: Option<&str>, io: &[&str], eo: &[&str]) -> TransBlock {
        TransBlock {
            gloss: gloss.map(String::from),
            io: io.iter().map(|s| s.to_string()).collect(),
            eo: eo.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn cooccurrence_pairs_across_blocks() {
        let page = pivot(
            "chair",
            vec![
                block(Some("seat"), &["stulo"], &[]),
                block(Some("chairperson"), &[], &["seĝo"]),
            ],
        );
        let cfg = SourceConfig::default();
        let entries = via_cooccurrence(DumpLang::En, &page, &cfg);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.lemma, "stulo");
        assert_eq!(entry.senses[0].sense_id.as_deref(), Some("en:chair"));
        assert_eq!(entry.senses[0].gloss.as_deref(), Some("chair"));
        assert_eq!(entry.senses[0].translations[0].term, "seĝo");
        assert_eq!(entry.senses[0].translations[0].confidence, 0.8);
        assert!(entry.provenance.contains(&Source::EnWiktionaryVia));
    }

    #[test]
    fn meaning_requires_same_block() {
        let page = pivot(
            "chaise",
            vec![
                block(Some("Siège avec dossier"), &["stulo"], &["seĝo"]),
                block(Some("Autre sens"), &["altro"], &[]),
                block(Some("Tria"), &[], &["alia"]),
            ],
        );
        let cfg = SourceConfig::default();
        let entries = via_meaning(&page, &cfg);
        // only the first block pairs; `altro`/`alia` sit in different blocks
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.lemma, "stulo");
        assert_eq!(entry.senses[0].gloss.as_deref(), Some("Siège avec dossier"));
        assert_eq!(entry.senses[0].sense_id.as_deref(), Some("fr:chaise#1"));
        assert_eq!(entry.senses[0].translations[0].term, "seĝo");
        assert_eq!(entry.senses[0].translations[0].confidence, 0.7);
        assert!(entry.provenance.contains(&Source::FrWiktionaryMeaning));
    }

    #[test]
    fn disabled_source_emits_nothing() {
        let page = pivot("chair", vec![block(None, &["stulo"], &["seĝo"])]);
        let mut cfg = SourceConfig::default();
        assert_eq!(via_cooccurrence(DumpLang::En, &page, &cfg).len(), 1);
        cfg.disable(Source::EnWiktionaryVia);
        assert!(via_cooccurrence(DumpLang::En, &page, &cfg).is_empty());
    }
}
