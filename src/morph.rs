//! Morphology inference for Ido lemmas.
//!
//! A paradigm names a morphotactic pattern; a downstream serializer expands
//! it into surface forms. Inference is a closed decision table over the
//! lemma suffix, conditioned on POS. New rules are additive.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lang::Pos;

/// Closed paradigm enumeration. Removing a variant is a breaking change.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum Paradigm {
    /// Ido noun in `-o`
    #[serde(rename = "o__n")]
    ONoun,
    /// Derived noun in `-ajo`
    #[serde(rename = "ajo__n")]
    AjoNoun,
    /// Adjective in `-a`
    #[serde(rename = "a__adj")]
    AAdj,
    /// Relational adjective in `-ala`
    #[serde(rename = "ala__adj")]
    AlaAdj,
    /// Abundance adjective in `-oza`
    #[serde(rename = "oza__adj")]
    OzaAdj,
    /// Capability adjective in `-iva`
    #[serde(rename = "iva__adj")]
    IvaAdj,
    /// Adverb in `-e`
    #[serde(rename = "e__adv")]
    EAdv,
    /// Verb in `-ar` / `-ir` / `-or`
    #[serde(rename = "ar__vblex")]
    ArVblex,
    /// Proper noun
    #[serde(rename = "np__np")]
    NpNp,
    /// Digit-shaped numeral
    #[serde(rename = "num_regex")]
    NumRegex,
    /// Closed-class pronoun
    #[serde(rename = "prn")]
    Prn,
    /// Closed-class preposition
    #[serde(rename = "pr")]
    Pr,
    /// Closed-class coordinating conjunction
    #[serde(rename = "cnjcoo")]
    Cnjcoo,
    /// Closed-class determiner
    #[serde(rename = "det")]
    Det,
    /// Closed-class interjection
    #[serde(rename = "ij")]
    Ij,
    /// No rule fired. The entry is retained but flagged.
    #[serde(rename = "unknown")]
    Unknown,
}

impl Paradigm {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ONoun => "o__n",
            Self::AjoNoun => "ajo__n",
            Self::AAdj => "a__adj",
            Self::AlaAdj => "ala__adj",
            Self::OzaAdj => "oza__adj",
            Self::IvaAdj => "iva__adj",
            Self::EAdv => "e__adv",
            Self::ArVblex => "ar__vblex",
            Self::NpNp => "np__np",
            Self::NumRegex => "num_regex",
            Self::Prn => "prn",
            Self::Pr => "pr",
            Self::Cnjcoo => "cnjcoo",
            Self::Det => "det",
            Self::Ij => "ij",
            Self::Unknown => "unknown",
        }
    }

    /// Default Esperanto-side paradigm for a POS, used for the translation
    /// half of a bidix surface entry.
    pub const fn default_for_eo(pos: Pos) -> Self {
        match pos {
            Pos::Noun => Self::ONoun,
            Pos::Verb => Self::ArVblex,
            Pos::Adjective => Self::AAdj,
            Pos::Adverb => Self::EAdv,
            Pos::ProperNoun => Self::NpNp,
            Pos::Pronoun => Self::Prn,
            Pos::Preposition => Self::Pr,
            Pos::Conjunction => Self::Cnjcoo,
            Pos::Determiner => Self::Det,
            Pos::Interjection => Self::Ij,
            Pos::Numeral => Self::NumRegex,
            Pos::Other | Pos::Unknown => Self::Unknown,
        }
    }
}

impl fmt::Display for Paradigm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Curated closed-class function words. Checked before the suffix rules so
/// that e.g. `la` does not land in the adjective paradigm.
const CLOSED_CLASS: &[(&str, Pos, Paradigm)] = &[
    // pronouns
    ("me", Pos::Pronoun, Paradigm::Prn),
    ("tu", Pos::Pronoun, Paradigm::Prn),
    ("vu", Pos::Pronoun, Paradigm::Prn),
    ("il", Pos::Pronoun, Paradigm::Prn),
    ("ilu", Pos::Pronoun, Paradigm::Prn),
    ("el", Pos::Pronoun, Paradigm::Prn),
    ("elu", Pos::Pronoun, Paradigm::Prn),
    ("ol", Pos::Pronoun, Paradigm::Prn),
    ("olu", Pos::Pronoun, Paradigm::Prn),
    ("lu", Pos::Pronoun, Paradigm::Prn),
    ("ni", Pos::Pronoun, Paradigm::Prn),
    ("vi", Pos::Pronoun, Paradigm::Prn),
    ("li", Pos::Pronoun, Paradigm::Prn),
    ("ili", Pos::Pronoun, Paradigm::Prn),
    ("eli", Pos::Pronoun, Paradigm::Prn),
    ("oli", Pos::Pronoun, Paradigm::Prn),
    ("su", Pos::Pronoun, Paradigm::Prn),
    ("onu", Pos::Pronoun, Paradigm::Prn),
    ("on", Pos::Pronoun, Paradigm::Prn),
    ("ico", Pos::Pronoun, Paradigm::Prn),
    ("ito", Pos::Pronoun, Paradigm::Prn),
    ("quo", Pos::Pronoun, Paradigm::Prn),
    ("qua", Pos::Pronoun, Paradigm::Prn),
    // prepositions
    ("a", Pos::Preposition, Paradigm::Pr),
    ("ad", Pos::Preposition, Paradigm::Pr),
    ("an", Pos::Preposition, Paradigm::Pr),
    ("che", Pos::Preposition, Paradigm::Pr),
    ("da", Pos::Preposition, Paradigm::Pr),
    ("de", Pos::Preposition, Paradigm::Pr),
    ("dil", Pos::Preposition, Paradigm::Pr),
    ("en", Pos::Preposition, Paradigm::Pr),
    ("ek", Pos::Preposition, Paradigm::Pr),
    ("for", Pos::Preposition, Paradigm::Pr),
    ("kun", Pos::Preposition, Paradigm::Pr),
    ("per", Pos::Preposition, Paradigm::Pr),
    ("po", Pos::Preposition, Paradigm::Pr),
    ("por", Pos::Preposition, Paradigm::Pr),
    ("pos", Pos::Preposition, Paradigm::Pr),
    ("pri", Pos::Preposition, Paradigm::Pr),
    ("pro", Pos::Preposition, Paradigm::Pr),
    ("sen", Pos::Preposition, Paradigm::Pr),
    ("sub", Pos::Preposition, Paradigm::Pr),
    ("sur", Pos::Preposition, Paradigm::Pr),
    ("til", Pos::Preposition, Paradigm::Pr),
    ("tra", Pos::Preposition, Paradigm::Pr),
    ("trans", Pos::Preposition, Paradigm::Pr),
    ("ultre", Pos::Preposition, Paradigm::Pr),
    ("vice", Pos::Preposition, Paradigm::Pr),
    // conjunctions
    ("e", Pos::Conjunction, Paradigm::Cnjcoo),
    ("ed", Pos::Conjunction, Paradigm::Cnjcoo),
    ("o", Pos::Conjunction, Paradigm::Cnjcoo),
    ("od", Pos::Conjunction, Paradigm::Cnjcoo),
    ("ma", Pos::Conjunction, Paradigm::Cnjcoo),
    ("nam", Pos::Conjunction, Paradigm::Cnjcoo),
    ("se", Pos::Conjunction, Paradigm::Cnjcoo),
    ("ke", Pos::Conjunction, Paradigm::Cnjcoo),
    ("do", Pos::Conjunction, Paradigm::Cnjcoo),
    // determiners
    ("la", Pos::Determiner, Paradigm::Det),
    ("le", Pos::Determiner, Paradigm::Det),
    ("ca", Pos::Determiner, Paradigm::Det),
    ("ta", Pos::Determiner, Paradigm::Det),
    ("omna", Pos::Determiner, Paradigm::Det),
    ("kelka", Pos::Determiner, Paradigm::Det),
    ("nula", Pos::Determiner, Paradigm::Det),
    ("singla", Pos::Determiner, Paradigm::Det),
    // interjections
    ("ho", Pos::Interjection, Paradigm::Ij),
    ("ve", Pos::Interjection, Paradigm::Ij),
    ("nu", Pos::Interjection, Paradigm::Ij),
];

static NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+([.,][0-9]+)*%?$").unwrap());

fn closed_class(lemma: &str) -> Option<(Pos, Paradigm)> {
    CLOSED_CLASS
        .iter()
        .find(|(word, _, _)| *word == lemma)
        .map(|&(_, pos, paradigm)| (pos, paradigm))
}

/// Assign a paradigm by suffix rules on the lemma, conditioned on POS.
///
/// `pos` may be `Unknown`; in that case the suffix alone decides, which is
/// how Wikipedia-derived titles get their POS refined afterwards.
pub fn infer_paradigm(lemma: &str, pos: Pos) -> Paradigm {
    if pos == Pos::ProperNoun {
        return Paradigm::NpNp;
    }

    if NUM_RE.is_match(lemma) {
        return Paradigm::NumRegex;
    }

    if let Some((cc_pos, paradigm)) = closed_class(lemma) {
        if pos == Pos::Unknown || pos == cc_pos {
            return paradigm;
        }
    }

    let noun_like = matches!(pos, Pos::Noun | Pos::Unknown);
    let adj_like = matches!(pos, Pos::Adjective | Pos::Unknown);
    let adv_like = matches!(pos, Pos::Adverb | Pos::Unknown);
    let verb_like = matches!(pos, Pos::Verb | Pos::Unknown);

    if noun_like && lemma.ends_with("ajo") {
        return Paradigm::AjoNoun;
    }
    if noun_like && lemma.ends_with('o') {
        return Paradigm::ONoun;
    }
    if adj_like && lemma.ends_with("ala") {
        return Paradigm::AlaAdj;
    }
    if adj_like && lemma.ends_with("oza") {
        return Paradigm::OzaAdj;
    }
    if adj_like && lemma.ends_with("iva") {
        return Paradigm::IvaAdj;
    }
    if adj_like && lemma.ends_with('a') {
        return Paradigm::AAdj;
    }
    if verb_like && (lemma.ends_with("ar") || lemma.ends_with("ir") || lemma.ends_with("or")) {
        return Paradigm::ArVblex;
    }
    // bare `-e` with unknown POS is ambiguous with closed-class words, so
    // only multi-syllable candidates commit to the adverb paradigm
    if adv_like
        && lemma.ends_with('e')
        && (pos == Pos::Adverb || lemma.chars().count() > 2)
    {
        return Paradigm::EAdv;
    }

    Paradigm::Unknown
}

/// POS implied by Ido morphotactics alone. Used for Wikipedia titles and
/// langlink pairs, which carry no POS header.
pub fn infer_pos(lemma: &str) -> Pos {
    if let Some((pos, _)) = closed_class(lemma) {
        return pos;
    }
    if NUM_RE.is_match(lemma) {
        return Pos::Numeral;
    }
    if lemma.ends_with('o') {
        return Pos::Noun;
    }
    if lemma.ends_with('a') {
        return Pos::Adjective;
    }
    if lemma.ends_with("ar") || lemma.ends_with("ir") || lemma.ends_with("or") {
        return Pos::Verb;
    }
    if lemma.ends_with('e') {
        return Pos::Adverb;
    }
    Pos::Unknown
}
