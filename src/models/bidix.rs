//! Surface-entry models: the exchange format handed to a serializer.

use serde::{Deserialize, Serialize};

use crate::Set;
use crate::config::Source;
use crate::lang::Pos;
use crate::morph::Paradigm;

/// One bilingual surface entry: a single Ido lemma paired with a single
/// Esperanto target form. Multi-sense entries expand to one of these per
/// distinct target term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BidixEntry {
    pub lemma: String,
    pub paradigm: Paradigm,
    pub translation: String,
    pub translation_paradigm: Paradigm,
    pub sources: Set<Source>,
}

/// One monolingual Ido entry: lemma plus paradigm, no translations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonodixEntry {
    pub lemma: String,
    pub pos: Pos,
    pub paradigm: Paradigm,
}
