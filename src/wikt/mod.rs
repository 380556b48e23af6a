//! Wiktionary page parsing.
//!
//! One parser, two dialects. The Io and Eo editions write translations as
//! inline `* {{eo}}: ...` lines under each sense; the En and Fr editions
//! write them inside `{{trans-top}}` / `{{trad-début}}` blocks. Which
//! dialect applies is decided by the dump, not sniffed per page.

pub mod section;
pub mod templates;
pub mod via;
pub mod wikipedia;

use serde::{Deserialize, Serialize};

use crate::Map;
use crate::Set;
use crate::clean::{CleanStats, clean_term, clean_valid_term, is_valid_lemma};
use crate::config::{Source, SourceConfig};
use crate::lang::{DumpLang, Lang, Pos};
use crate::models::entry::{Entry, Sense, Translation};
use crate::morph::Paradigm;
use crate::reader::dump::Page;
use crate::wikt::section::{
    inline_translation_lines, language_section, pos_subsections, split_senses,
};
use crate::wikt::templates::{extract_terms, has_translation_template};

/// Closed set of source parsers the orchestrator dispatches over. Adding a
/// source is a new variant plus one match arm per dispatch site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceParser {
    /// Io / Eo Wiktionary, inline dialect.
    WiktionaryInline { dump: DumpLang },
    /// En / Fr Wiktionary, template dialect, consumed by the via builder.
    WiktionaryTemplate { dump: DumpLang },
    /// Langlinks SQL dump joined against Wikipedia titles.
    LanglinkPivot,
    /// Ido Wikipedia title classification.
    WikipediaCategory,
}

impl SourceParser {
    /// Stage name, doubling as the stats-artifact key.
    pub const fn stage_name(self) -> &'static str {
        match self {
            Self::WiktionaryInline { dump: DumpLang::Io } => "io-wiktionary",
            Self::WiktionaryInline { dump: DumpLang::Eo } => "eo-wiktionary",
            Self::WiktionaryTemplate { dump: DumpLang::En } => "en-wiktionary",
            Self::WiktionaryTemplate { dump: DumpLang::Fr } => "fr-wiktionary",
            Self::LanglinkPivot => "langlinks",
            Self::WikipediaCategory => "wikipedia",
            // inline on en/fr and template on io/eo are never constructed
            Self::WiktionaryInline { .. } => "inline",
            Self::WiktionaryTemplate { .. } => "template",
        }
    }
}

/// Counters carried per extraction stage and merged by the reporter.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ParseStats {
    pub pages_seen: u64,
    pub pages_matched: u64,
    pub entries_emitted: u64,
    pub parse_errors: u64,
    pub clean: CleanStats,
}

impl ParseStats {
    pub fn absorb(&mut self, other: &Self) {
        self.pages_seen += other.pages_seen;
        self.pages_matched += other.pages_matched;
        self.entries_emitted += other.entries_emitted;
        self.parse_errors += other.parse_errors;
        self.clean.absorb(&other.clean);
    }
}

/// Terms from one inline translation line, or from a definition-text
/// fallback: templates win when present, otherwise the content is a
/// comma-separated plain list.
fn terms_from_content(
    content: &str,
    target: Lang,
    stats: &mut ParseStats,
) -> Vec<String> {
    let mut terms = Vec::new();
    if has_translation_template(content) {
        for raw in extract_terms(content, target) {
            if let Some(term) = clean_valid_term(&raw, &mut stats.clean) {
                terms.push(term);
            }
        }
    } else {
        for raw in content.split(',') {
            if raw.trim().is_empty() {
                continue;
            }
            if let Some(term) = clean_valid_term(raw, &mut stats.clean) {
                terms.push(term);
            }
        }
    }
    terms
}

/// Parse one Io/Eo Wiktionary page into entries headed in the dump's own
/// language, with translations into `target`.
///
/// The Io dump additionally treats the numbered-definition text itself as a
/// translation candidate when a sense carries no inline line, and emits
/// bare entries (zero senses) for monolingual coverage.
pub fn parse_inline_page(
    dump: DumpLang,
    page: &Page,
    cfg: &SourceConfig,
    stats: &mut ParseStats,
) -> Vec<Entry> {
    stats.pages_seen += 1;

    let (language, target, tag) = match dump {
        DumpLang::Io => (Lang::Io, Lang::Eo, Source::IoWiktionary),
        DumpLang::Eo => (Lang::Eo, Lang::Io, Source::EoWiktionary),
        DumpLang::En | DumpLang::Fr => return Vec::new(),
    };

    let Some(section) = language_section(dump, &page.text) else {
        return Vec::new();
    };
    stats.pages_matched += 1;

    let lemma = clean_term(&page.title);
    if lemma.is_empty() || !is_valid_lemma(&lemma) {
        stats.clean.rejected_lemmas += 1;
        return Vec::new();
    }
    let original_lemma = (lemma != page.title).then(|| page.title.clone());

    let confidence = cfg.confidence(tag);
    let keep_bare = dump == DumpLang::Io;
    let harvest_definitions = dump == DumpLang::Io;

    // one entry per POS, senses in source order
    let mut by_pos: Map<Pos, Vec<Sense>> = Map::default();

    for (pos, body) in pos_subsections(section) {
        let senses = by_pos.entry(pos).or_default();
        for block in split_senses(body) {
            let mut translations = Vec::new();

            let inline = inline_translation_lines(&block.text, target);
            if inline.is_empty() {
                if harvest_definitions {
                    for term in terms_from_content(&block.text, target, stats) {
                        translations
                            .push(Translation::attested(term, target, tag, confidence));
                    }
                }
            } else {
                for content in inline {
                    for term in terms_from_content(content, target, stats) {
                        translations
                            .push(Translation::attested(term, target, tag, confidence));
                    }
                }
            }

            // numbered senses keep their definition line as gloss; the
            // implicit whole-body sense would only echo its own lines
            let gloss = block
                .id
                .is_some()
                .then(|| block.text.lines().next().map(clean_term))
                .flatten()
                .filter(|g| !g.is_empty());

            if !translations.is_empty() || block.id.is_some() {
                senses.push(Sense {
                    sense_id: block.id,
                    gloss,
                    translations,
                });
            }
        }
    }

    let mut entries = Vec::new();
    for (pos, senses) in by_pos {
        let senses: Vec<Sense> = senses
            .into_iter()
            .filter(|s| !s.translations.is_empty() || keep_bare)
            .collect();
        if senses.iter().all(|s| s.translations.is_empty()) && !keep_bare {
            continue;
        }

        let mut entry = Entry::new(lemma.clone(), language, pos, tag);
        entry.original_lemma = original_lemma.clone();
        entry.senses = senses;
        if pos == Pos::ProperNoun {
            entry.morphology = Some(Paradigm::NpNp);
        }
        stats.entries_emitted += 1;
        entries.push(entry);
    }
    entries
}

/// One translation block of a pivot page (`{{trans-top|gloss}}` ... or
/// `{{trad-début|gloss}}` ...).
#[derive(Debug, Default, Clone)]
pub struct TransBlock {
    pub gloss: Option<String>,
    pub io: Vec<String>,
    pub eo: Vec<String>,
}

/// A pivot-language page reduced to its Ido/Esperanto translation evidence.
#[derive(Debug, Clone)]
pub struct PivotPage {
    pub headword: String,
    pub blocks: Vec<TransBlock>,
}

fn block_open(dump: DumpLang, line: &str) -> Option<Option<String>> {
    let marker = match dump {
        DumpLang::En => "{{trans-top",
        DumpLang::Fr => "{{trad-début",
        _ => return None,
    };
    let start = line.find(marker)?;
    let rest = &line[start + marker.len()..];
    let gloss = rest
        .strip_prefix('|')
        .and_then(|args| args.split("}}").next())
        .map(|args| clean_term(args.split('|').next().unwrap_or_default()))
        .filter(|g| !g.is_empty());
    Some(gloss)
}

fn block_close(dump: DumpLang, line: &str) -> bool {
    match dump {
        DumpLang::En => line.contains("{{trans-bottom"),
        DumpLang::Fr => line.contains("{{trad-fin"),
        _ => false,
    }
}

fn collect_block_line(line: &str, block: &mut TransBlock, stats: &mut ParseStats) {
    for target in [Lang::Io, Lang::Eo] {
        let mut terms: Set<String> = Set::default();
        for content in inline_translation_lines(line, target) {
            terms.extend(terms_from_content(content, target, stats));
        }
        if terms.is_empty() {
            // unlabelled line: fall back on the template's own language arg
            for raw in extract_terms(line, target) {
                if let Some(term) = clean_valid_term(&raw, &mut stats.clean) {
                    terms.insert(term);
                }
            }
        }
        let bucket = match target {
            Lang::Io => &mut block.io,
            Lang::Eo => &mut block.eo,
        };
        for term in terms {
            if !bucket.contains(&term) {
                bucket.push(term);
            }
        }
    }
}

/// Parse one En/Fr Wiktionary page into its pivot translation blocks.
/// Pages whose blocks never mention both Ido and Esperanto still come back
/// (the via builder decides what pairs up); pages without any block or any
/// Io/Eo evidence yield `None`.
pub fn parse_pivot_page(
    dump: DumpLang,
    page: &Page,
    stats: &mut ParseStats,
) -> Option<PivotPage> {
    stats.pages_seen += 1;

    let section = language_section(dump, &page.text)?;
    stats.pages_matched += 1;

    let headword = clean_term(&page.title);
    if headword.is_empty() || !is_valid_lemma(&headword) {
        stats.clean.rejected_lemmas += 1;
        return None;
    }

    let mut blocks = Vec::new();
    let mut current: Option<TransBlock> = None;

    for line in section.lines() {
        if let Some(gloss) = block_open(dump, line) {
            // an unterminated previous block closes here
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            current = Some(TransBlock {
                gloss,
                ..Default::default()
            });
            continue;
        }
        if block_close(dump, line) {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            continue;
        }
        if let Some(block) = current.as_mut() {
            collect_block_line(line, block, stats);
        }
    }
    if let Some(block) = current.take() {
        blocks.push(block);
    }

    blocks.retain(|b| !b.io.is_empty() || !b.eo.is_empty());
    if blocks.is_empty() {
        return None;
    }

    Some(PivotPage { headword, blocks })
}
