//! Ido Wikipedia vocabulary: classify article titles by category patterns,
//! derive POS from Ido morphotactics, and accumulate the token-frequency
//! table the frequency gate and the coverage report run on.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Map;
use crate::clean::{clean_term, is_valid_lemma_exempt};
use crate::config::Source;
use crate::lang::{Lang, Pos};
use crate::models::entry::Entry;
use crate::morph::{infer_paradigm, infer_pos};
use crate::wikt::ParseStats;

static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(?:Kategorio|Category):([^\]|]+)").unwrap());
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{Alphabetic}]+").unwrap());
static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^{}]*\}\}|\[\[[^\]|]*\||\]\]|'''|''|<[^>]+>").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleClass {
    Person,
    Place,
    Organization,
    Species,
    Common,
}

/// Page-id keyed record written by the Wikipedia stage so the langlinks
/// stage can resolve `ll_from` ids to titles and their classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleRecord {
    pub title: String,
    pub class: TitleClass,
}

/// Category-name fragments, matched lowercased. Curated from the category
/// tree of the Ido Wikipedia.
const PERSON_PATTERNS: &[&str] = &[
    "homi", "personi", "naskinti", "mortinti", "skripteri", "autori", "politikisti", "cientisti",
];
const PLACE_PATTERNS: &[&str] = &[
    "urbi", "landi", "komuni", "rivieri", "monti", "insuli", "regioni", "stati", "cheflandurbi",
];
const ORGANIZATION_PATTERNS: &[&str] = &[
    "organizuri", "kompanii", "entraprezi", "instituci", "universitati", "asoci",
];
const SPECIES_PATTERNS: &[&str] = &["planti", "animali", "speci", "mamiferi", "uceli", "fishi"];

fn any_pattern(categories: &[String], patterns: &[&str]) -> bool {
    categories
        .iter()
        .any(|cat| patterns.iter().any(|p| cat.contains(p)))
}

/// Classify a page from its category links.
pub fn classify(text: &str) -> TitleClass {
    let categories: Vec<String> = CATEGORY_RE
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_lowercase())
        .collect();

    if any_pattern(&categories, PERSON_PATTERNS) {
        TitleClass::Person
    } else if any_pattern(&categories, PLACE_PATTERNS) {
        TitleClass::Place
    } else if any_pattern(&categories, ORGANIZATION_PATTERNS) {
        TitleClass::Organization
    } else if any_pattern(&categories, SPECIES_PATTERNS) {
        TitleClass::Species
    } else {
        TitleClass::Common
    }
}

impl TitleClass {
    pub const fn is_proper(self) -> bool {
        matches!(self, Self::Person | Self::Place | Self::Organization)
    }

    fn pos_for(self, lemma: &str) -> Pos {
        match self {
            Self::Person | Self::Place | Self::Organization => Pos::ProperNoun,
            Self::Species => Pos::Noun,
            Self::Common => infer_pos(lemma),
        }
    }
}

/// One vocabulary entry from a Wikipedia title, or `None` when the cleaned
/// title fails validation. Organization titles may be acronyms.
pub fn vocab_entry(title: &str, class: TitleClass, stats: &mut ParseStats) -> Option<Entry> {
    let tag = Source::IoWikipedia;

    let lemma = clean_term(title);
    let allow_acronym = class == TitleClass::Organization;
    if lemma.is_empty() || !is_valid_lemma_exempt(&lemma, allow_acronym) {
        stats.clean.rejected_lemmas += 1;
        return None;
    }

    // common titles fold like ordinary lemmas; proper classes keep casing
    let lemma = if class.is_proper() {
        lemma
    } else {
        lemma.to_lowercase()
    };

    let pos = class.pos_for(&lemma);
    let mut entry = Entry::new(lemma.clone(), Lang::Io, pos, tag);
    entry.original_lemma = (entry.lemma != title).then(|| title.to_string());
    if pos == Pos::ProperNoun {
        entry.morphology = Some(infer_paradigm(&lemma, pos));
    }
    stats.entries_emitted += 1;
    Some(entry)
}

/// Lowercased alphabetic tokens of one article body, markup removed, added
/// to the running frequency table.
pub fn accumulate_frequency(text: &str, freq: &mut Map<String, u64>) {
    let stripped = MARKUP_RE.replace_all(text, " ");
    for token in TOKEN_RE.find_iter(&stripped) {
        let token = token.as_str().to_lowercase();
        if token.chars().count() < 2 {
            continue;
        }
        *freq.entry(token).or_insert(0) += 1;
    }
}

/// The top-N lemmas of a frequency table, deterministically: count
/// descending, then lexicographic.
pub fn top_n_set(freq: &Map<String, u64>, n: usize) -> crate::Set<String> {
    let mut ranked: Vec<(&String, &u64)> = freq.iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(n).map(|(w, _)| w.clone()).collect()
}
