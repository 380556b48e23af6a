//! Wikitext sectioning: language sections, POS subsections, sense blocks,
//! inline translation lines.

use std::sync::LazyLock;

use regex::Regex;

use crate::lang::{DumpLang, Lang, Pos};

static HEADING2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^==([^=\n][^\n]*?)==[ \t]*$").unwrap());
static HEADING3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^={3,}([^=\n]+?)={3,}[ \t]*$").unwrap());
static HEAD_TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\{\{([^{}]*)\}\}$").unwrap());
static SENSE_MARK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"'''(\d+)\.'''").unwrap());
static DEF_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#([^:*#\n].*)$").unwrap());
static INLINE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\*\s*(?:\{\{T\|([a-z]{2,3})(?:\|[^{}]*)?\}\}|\{\{([a-z]{2,3})\}\}|([A-Za-z]+))\s*:\s*(.+)$")
        .unwrap()
});

/// Resolve a heading's display to a comparable name: `{{io}}` -> `io`,
/// `{{langue|fr}}` -> `fr`, `Ido` -> `Ido`.
fn heading_name(inner: &str) -> String {
    let inner = inner.trim();
    if let Some(caps) = HEAD_TEMPLATE_RE.captures(inner) {
        let mut parts = caps[1].split('|').map(str::trim);
        let name = parts.next().unwrap_or_default();
        if name == "langue" || name == "S" {
            return parts.next().unwrap_or_default().to_string();
        }
        return name.to_string();
    }
    inner.to_string()
}

fn heading_matches(dump: DumpLang, name: &str) -> bool {
    if name == dump.as_str() {
        return true;
    }
    let lowered = name.to_lowercase();
    dump.section_names()
        .iter()
        .any(|n| n.to_lowercase() == lowered)
}

/// Slice of the page body belonging to the dump's own language section:
/// from its `== ... ==` heading to the next level-2 heading or EOF.
pub fn language_section<'a>(dump: DumpLang, text: &'a str) -> Option<&'a str> {
    let mut start = None;
    for caps in HEADING2_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        if let Some(s) = start {
            return Some(&text[s..whole.start()]);
        }
        if heading_matches(dump, &heading_name(&caps[1])) {
            start = Some(whole.end());
        }
    }
    start.map(|s| &text[s..])
}

/// POS subsections of a language section. A section without level-3 headers
/// is one `Unknown` subsection spanning the whole body.
pub fn pos_subsections(section: &str) -> Vec<(Pos, &str)> {
    let headings: Vec<_> = HEADING3_RE.captures_iter(section).collect();
    if headings.is_empty() {
        return vec![(Pos::Unknown, section)];
    }

    let mut subsections = Vec::with_capacity(headings.len());
    for (i, caps) in headings.iter().enumerate() {
        let whole = caps.get(0).unwrap();
        let pos = Pos::from_header(&heading_name(&caps[1]));
        let end = headings
            .get(i + 1)
            .map_or(section.len(), |next| next.get(0).unwrap().start());
        subsections.push((pos, &section[whole.end()..end]));
    }
    subsections
}

/// One numbered meaning within a POS subsection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenseBlock {
    pub id: Option<String>,
    pub text: String,
}

/// Split a subsection body into sense blocks: by `'''N.'''` markers when
/// present, else by `#` definition lines, else the whole body is one sense.
pub fn split_senses(body: &str) -> Vec<SenseBlock> {
    let marks: Vec<_> = SENSE_MARK_RE.captures_iter(body).collect();
    if !marks.is_empty() {
        let mut senses = Vec::with_capacity(marks.len());
        for (i, caps) in marks.iter().enumerate() {
            let whole = caps.get(0).unwrap();
            let end = marks
                .get(i + 1)
                .map_or(body.len(), |next| next.get(0).unwrap().start());
            let text = body[whole.end()..end]
                .trim()
                .trim_end_matches(';')
                .trim()
                .to_string();
            senses.push(SenseBlock {
                id: Some(caps[1].to_string()),
                text,
            });
        }
        return senses;
    }

    let def_lines: Vec<_> = DEF_LINE_RE.captures_iter(body).collect();
    if !def_lines.is_empty() {
        return def_lines
            .iter()
            .enumerate()
            .map(|(i, caps)| SenseBlock {
                id: Some((i + 1).to_string()),
                text: caps[1].trim().to_string(),
            })
            .collect();
    }

    vec![SenseBlock {
        id: None,
        text: body.trim().to_string(),
    }]
}

/// Inline translation lines (`* {{eo}}: ...`, `* Esperanto: ...`) for one
/// target language. The capture runs to end of line; template stripping
/// happens later in the cleaner, so pipes inside templates survive.
pub fn inline_translation_lines<'a>(fragment: &'a str, target: Lang) -> Vec<&'a str> {
    let mut contents = Vec::new();
    for caps in INLINE_LINE_RE.captures_iter(fragment) {
        let lang_label = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
            .or_else(|| caps.get(3).map(|m| m.as_str().to_lowercase()));
        let Some(label) = lang_label else { continue };

        let matches_target =
            label == target.as_str() || label == target.long().to_lowercase();
        if matches_target {
            contents.push(caps.get(4).unwrap().as_str());
        }
    }
    contents
}
