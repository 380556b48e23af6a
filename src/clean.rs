//! Lemma / translation-term cleaning and validation.
//!
//! The cleaner strips wiki markup in a fixed rule order; the validator then
//! accepts or rejects the result. Rejection is final: the caller drops the
//! entry and counts it, there is no repair.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::wikt::templates::{TemplateAction, cleaner_action};

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'''(.+?)'''").unwrap());
static ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"''(.+?)''").unwrap());
static NUM_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:'''\d+\.'''|\d+\.)\s*").unwrap());
static LINK_PIPED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[[^\]|]*\|([^\]]*)\]\]").unwrap());
static LINK_PLAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]*)\]\]").unwrap());
static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").unwrap());
static TRAILING_LANG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([a-z]{2,3}\)\s*$").unwrap());
static EMPTY_PARENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(\s*\)").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Characters trimmed from both ends of a cleaned term. Hyphen stays (Ido
/// affix lemmas are written with it); apostrophe stays so unbalanced bold
/// markup reaches the validator instead of being silently repaired.
const TRIM_PUNCT: &[char] = &[
    '.', ',', ';', ':', '!', '?', '*', '#', '%', '(', ')', '"', '[', ']', '{', '}', '=',
];

/// Strip wiki markup from a candidate lemma or translation term.
///
/// The rule order is load-bearing: bold/italic first so numbered-definition
/// prefixes become visible, links before templates so piped displays
/// survive, trailing language indicators last.
pub fn clean_term(raw: &str) -> String {
    let mut s: String = raw.nfc().collect();

    // gender symbols, with or without their italic wrapping
    for marker in ["(''♀'')", "(''♂'')", "♀", "♂"] {
        s = s.replace(marker, "");
    }

    s = BOLD_RE.replace_all(&s, "$1").into_owned();
    s = ITALIC_RE.replace_all(&s, "$1").into_owned();
    s = NUM_PREFIX_RE.replace(&s, "").into_owned();
    s = LINK_PIPED_RE.replace_all(&s, "$1").into_owned();
    s = LINK_PLAIN_RE.replace_all(&s, "$1").into_owned();

    // Templates can nest one level (`{{a|{{b}}}}`); resolving innermost
    // first converges in a couple of passes.
    for _ in 0..3 {
        if !TEMPLATE_RE.is_match(&s) {
            break;
        }
        s = TEMPLATE_RE
            .replace_all(&s, |caps: &regex::Captures| match cleaner_action(&caps[1]) {
                TemplateAction::Replace(word) => word,
                TemplateAction::Remove => String::new(),
            })
            .into_owned();
    }

    s = TRAILING_LANG_RE.replace(&s, "").into_owned();
    s = EMPTY_PARENS_RE.replace_all(&s, "").into_owned();
    s = WS_RE.replace_all(&s, " ").into_owned();
    s.trim().trim_matches(TRIM_PUNCT).trim().to_string()
}

/// Validity predicate for a cleaned lemma (also applied to translation
/// terms). Unresolved markup is a rejection, never a repair.
pub fn is_valid_lemma(cleaned: &str) -> bool {
    is_valid_lemma_exempt(cleaned, false)
}

/// `allow_acronym` lifts the all-uppercase rule for Wikipedia organization
/// titles, which legitimately are acronyms.
pub fn is_valid_lemma_exempt(cleaned: &str, allow_acronym: bool) -> bool {
    let char_count = cleaned.chars().count();
    if char_count < 2 {
        return false;
    }

    let Some(first) = cleaned.chars().next() else {
        return false;
    };
    if !first.is_alphabetic() {
        return false;
    }

    if cleaned.contains("'''")
        || cleaned.contains("[[")
        || cleaned.contains("]]")
        || cleaned.contains("{{")
        || cleaned.contains("}}")
    {
        return false;
    }

    // sentence-like titles
    if char_count > 30 && cleaned.contains(':') {
        return false;
    }

    if !allow_acronym {
        let alphabetic: Vec<char> = cleaned.chars().filter(|c| c.is_alphabetic()).collect();
        if char_count > 4 && alphabetic.iter().all(|c| c.is_uppercase()) {
            return false;
        }
    }

    true
}

/// Rejection / drop counters surfaced in the statistics report.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CleanStats {
    pub rejected_lemmas: u64,
    pub dropped_terms: u64,
}

impl CleanStats {
    pub fn absorb(&mut self, other: &Self) {
        self.rejected_lemmas += other.rejected_lemmas;
        self.dropped_terms += other.dropped_terms;
    }
}

/// Clean and validate in one step; `None` counts as a dropped term.
pub fn clean_valid_term(raw: &str, stats: &mut CleanStats) -> Option<String> {
    let cleaned = clean_term(raw);
    if cleaned.is_empty() || !is_valid_lemma(&cleaned) {
        stats.dropped_terms += 1;
        return None;
    }
    Some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_prefix_and_lang_indicator() {
        assert_eq!(clean_term("'''1.''' tu (io)"), "tu");
    }

    #[test]
    fn bold_link_display() {
        assert_eq!(clean_term("'''[[altra|ALTRA]]'''"), "ALTRA");
    }

    #[test]
    fn translation_template_plus_qualifier() {
        assert_eq!(clean_term("{{tr|io|hundo}} {{qualifier|common}}"), "hundo common");
    }

    #[test]
    fn language_code_templates_vanish() {
        assert_eq!(clean_term("{{io}} hundo"), "hundo");
        assert_eq!(clean_term("{{eo}}: {{t|eo|hundo}}"), "hundo");
    }

    #[test]
    fn plain_link_target() {
        assert_eq!(clean_term("[[hundo]]"), "hundo");
    }

    #[test]
    fn gender_symbols() {
        assert_eq!(clean_term("kato (''♀'')"), "kato");
    }

    #[test]
    fn unbalanced_markup_is_rejected_not_repaired() {
        let cleaned = clean_term("'''abelo");
        assert_eq!(cleaned, "'''abelo");
        assert!(!is_valid_lemma(&cleaned));
        assert!(!is_valid_lemma("'''abelo"));
    }

    #[test]
    fn validator_rules() {
        assert!(is_valid_lemma("hundo"));
        assert!(is_valid_lemma("ĉevalo"));
        assert!(is_valid_lemma("vice-rejo"));
        assert!(!is_valid_lemma("a"));
        assert!(!is_valid_lemma("1905"));
        assert!(!is_valid_lemma("[[hundo]]"));
        assert!(!is_valid_lemma("NATO2"));
        assert!(is_valid_lemma_exempt("UNESCO", true));
        assert!(!is_valid_lemma_exempt("UNESCO", false));
        // short acronyms pass even without the exemption
        assert!(is_valid_lemma("ONU"));
    }

    #[test]
    fn colon_only_rejected_when_long() {
        assert!(is_valid_lemma("di:io"));
        let long = "frazo simila a titolo: tre longa klarigo";
        assert!(!is_valid_lemma(long));
    }

    #[test]
    fn whitespace_collapse() {
        assert_eq!(clean_term("  hundo   kato  "), "hundo kato");
    }
}
