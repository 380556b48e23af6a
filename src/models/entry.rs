//! Canonical entry schema carried through every pipeline stage.
//!
//! Entries are written between stages as JSONL, one entry per line. The
//! schema is the exchange format with any external serializer, so field
//! names are stable.

use serde::{Deserialize, Serialize};

use crate::Set;
use crate::config::Source;
use crate::lang::{Lang, Pos};
use crate::morph::Paradigm;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Entry {
    /// Headword in its base language. Case-sensitive; proper nouns keep the
    /// initial capital.
    pub lemma: String,

    pub language: Lang,

    pub pos: Pos,

    /// Numbered meanings in source order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub senses: Vec<Sense>,

    /// Populated by morphology inference; absent until then.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morphology: Option<Paradigm>,

    /// Contributing sources at entry level. Never empty after parsing.
    pub provenance: Set<Source>,

    /// Pre-cleaning lemma, retained for audit when cleaning changed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_lemma: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Sense {
    /// Opaque, unique within the entry. Examples: `"1"`, `"fr:chaise#1"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sense_id: Option<String>,

    /// Short description, e.g. the pivot-language meaning label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gloss: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub translations: Vec<Translation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Translation {
    pub term: String,
    pub lang: Lang,
    pub confidence: f64,
    /// All sources that attested this translation for this sense. Non-empty.
    pub sources: Set<Source>,
}

impl Entry {
    pub fn new(lemma: impl Into<String>, language: Lang, pos: Pos, source: Source) -> Self {
        let mut provenance = Set::default();
        provenance.insert(source);
        Self {
            lemma: lemma.into(),
            language,
            pos,
            provenance,
            ..Default::default()
        }
    }

    pub fn is_proper_noun(&self) -> bool {
        self.pos == Pos::ProperNoun
    }

    /// Lemma as used in the merge bucket key: proper nouns preserve case,
    /// everything else is case-folded.
    pub fn key_lemma(&self) -> String {
        if self.is_proper_noun() {
            self.lemma.clone()
        } else {
            self.lemma.to_lowercase()
        }
    }

    /// True when the entry's only support is the given source.
    pub fn only_from(&self, source: Source) -> bool {
        self.provenance.len() == 1 && self.provenance.contains(&source)
    }

    pub fn translation_count(&self) -> usize {
        self.senses.iter().map(|s| s.translations.len()).sum()
    }

    /// Distinct translation terms per target language, sorted. This is the
    /// identity used by duplicate removal.
    pub fn translation_term_set(&self) -> Vec<(Lang, String)> {
        let mut set: Set<(Lang, String)> = Set::default();
        for sense in &self.senses {
            for tr in &sense.translations {
                set.insert((tr.lang, tr.term.clone()));
            }
        }
        let mut terms: Vec<_> = set.into_iter().collect();
        terms.sort();
        terms
    }
}

impl Sense {
    /// Signature used to collapse equal senses across sources: the
    /// normalized gloss plus the sorted, lowercased translation terms.
    pub fn signature(&self) -> (String, Vec<(Lang, String)>) {
        let gloss = self
            .gloss
            .as_deref()
            .map(|g| g.trim().to_lowercase())
            .unwrap_or_default();
        let mut terms: Vec<_> = self
            .translations
            .iter()
            .map(|t| (t.lang, t.term.to_lowercase()))
            .collect();
        terms.sort();
        terms.dedup();
        (gloss, terms)
    }
}

impl Translation {
    pub fn attested(term: impl Into<String>, lang: Lang, source: Source, confidence: f64) -> Self {
        let mut sources = Set::default();
        sources.insert(source);
        Self {
            term: term.into(),
            lang,
            confidence,
            sources,
        }
    }
}
