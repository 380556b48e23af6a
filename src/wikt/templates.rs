//! Translation-template extraction.
//!
//! The handler table is closed at compile time: templates we recognize are
//! either kept (they carry a translation word), skipped (they mark unchecked
//! or missing translations), or stripped (decoration). Everything else falls
//! through to the default drop handler.

use std::sync::LazyLock;

use regex::Regex;

use crate::lang::Lang;

/// Templates whose second positional argument is a translation word, with
/// the first argument naming the target language.
const KEEP_TEMPLATES: &[&str] = &["t", "t+", "tt", "tt+", "l", "m", "trad", "trad+", "tr"];

/// Translation placeholders that must not produce a term.
const SKIP_TEMPLATES: &[&str] = &["t-check", "t-needed"];

/// Decoration removed before extraction.
const STRIP_TEMPLATES: &[&str] = &["qualifier", "q", "sense", "lb", "gloss"];

static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").unwrap());

/// What the cleaner should do with one template occurrence.
pub enum TemplateAction {
    /// Replace the template with this text.
    Replace(String),
    /// Remove the template entirely.
    Remove,
}

/// One parsed `{{...}}` occurrence: name plus positional arguments.
/// Named (`key=value`) arguments are dropped; the translation templates we
/// care about are positional.
fn parse_template(body: &str) -> (String, Vec<&str>) {
    let mut parts = body.split('|');
    let name = parts.next().unwrap_or_default().trim().to_string();
    let args: Vec<&str> = parts
        .map(str::trim)
        .filter(|arg| !arg.contains('='))
        .collect();
    (name, args)
}

/// Dispatch for the generic cleaner (spec'd template rules):
/// translation templates yield their word, single-argument templates yield
/// the argument, everything else is removed.
pub fn cleaner_action(body: &str) -> TemplateAction {
    let (name, args) = parse_template(body);

    if KEEP_TEMPLATES.contains(&name.as_str()) && args.len() >= 2 {
        return TemplateAction::Replace(args[1].to_string());
    }
    if SKIP_TEMPLATES.contains(&name.as_str()) {
        return TemplateAction::Remove;
    }
    match args.len() {
        1 => TemplateAction::Replace(args[0].to_string()),
        // `{{io}}`, `{{trans-bottom}}`, gender/number markers and any other
        // zero-argument template
        _ => TemplateAction::Remove,
    }
}

/// Extract translation terms for one target language from a fragment of
/// wikitext (a line, or a whole translation block).
pub fn extract_terms(fragment: &str, want: Lang) -> Vec<String> {
    let mut terms = Vec::new();
    for caps in TEMPLATE_RE.captures_iter(fragment) {
        let (name, args) = parse_template(&caps[1]);
        if SKIP_TEMPLATES.contains(&name.as_str()) || STRIP_TEMPLATES.contains(&name.as_str()) {
            continue;
        }
        if !KEEP_TEMPLATES.contains(&name.as_str()) {
            continue;
        }
        let [lang_code, word, ..] = args.as_slice() else {
            continue;
        };
        if *lang_code == want.as_str() && !word.is_empty() {
            terms.push((*word).to_string());
        }
    }
    terms
}

/// True when the fragment contains at least one translation template,
/// regardless of language.
pub fn has_translation_template(fragment: &str) -> bool {
    TEMPLATE_RE.captures_iter(fragment).any(|caps| {
        let (name, args) = parse_template(&caps[1]);
        KEEP_TEMPLATES.contains(&name.as_str()) && args.len() >= 2
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_by_language() {
        let line = "* Ido: {{t|io|stulo}}, {{t+|io|sidilo}} {{qualifier|rare}}";
        assert_eq!(extract_terms(line, Lang::Io), vec!["stulo", "sidilo"]);
        assert!(extract_terms(line, Lang::Eo).is_empty());
    }

    #[test]
    fn skip_templates_yield_nothing() {
        let line = "* Esperanto: {{t-check|eo|dubinda}}, {{t-needed|eo}}";
        assert!(extract_terms(line, Lang::Eo).is_empty());
    }

    #[test]
    fn french_trad_templates() {
        let line = "* {{T|eo}} : {{trad+|eo|seĝo}}";
        assert_eq!(extract_terms(line, Lang::Eo), vec!["seĝo"]);
    }

    #[test]
    fn cleaner_actions() {
        match cleaner_action("tr|io|hundo") {
            TemplateAction::Replace(w) => assert_eq!(w, "hundo"),
            TemplateAction::Remove => panic!("translation template must keep its word"),
        }
        match cleaner_action("qualifier|common") {
            TemplateAction::Replace(w) => assert_eq!(w, "common"),
            TemplateAction::Remove => panic!("single-argument template must keep its argument"),
        }
        assert!(matches!(cleaner_action("io"), TemplateAction::Remove));
        assert!(matches!(cleaner_action("t-check|eo|ulo"), TemplateAction::Remove));
    }
}
