//! Streaming reader for bz2-compressed MediaWiki XML dumps.
//!
//! Decompression and XML parsing both stream; memory stays O(page size)
//! regardless of dump size. Only main-namespace article pages come out.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use bzip2::read::MultiBzDecoder;
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::warn;

/// One article page. `id` is the MediaWiki page id, used to resolve
/// langlink rows.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub id: u64,
    pub title: String,
    pub text: String,
}

/// Namespace prefixes that slip through the `<ns>` filter on some dumps
/// (old rows, imported pages). Checked against the title itself.
const NAMESPACE_PREFIXES: &[&str] = &[
    "Kategorio",
    "Category",
    "File",
    "Dosiero",
    "Arkivo",
    "Imajo",
    "Shablono",
    "Template",
    "Wikipedio",
    "Wikipedia",
    "Wikivortaro",
    "Uzanto",
    "User",
    "MediaWiki",
    "Mediawiki",
    "Modulo",
    "Module",
    "Helpo",
    "Help",
];

pub fn is_article_title(title: &str) -> bool {
    match title.split_once(':') {
        Some((prefix, _)) => !NAMESPACE_PREFIXES.contains(&prefix.trim()),
        None => true,
    }
}

enum Field {
    None,
    Title,
    Ns,
    Id,
    Text,
}

pub struct DumpReader {
    reader: Reader<BufReader<MultiBzDecoder<BufReader<File>>>>,
    buf: Vec<u8>,
    /// Pages yielded so far (post-filter).
    pub pages_read: u64,
    /// Pages dropped for per-page faults (missing title, bad ns).
    pub pages_faulty: u64,
    /// Pages dropped by the namespace / title filters.
    pub pages_skipped: u64,
}

impl DumpReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening dump {}", path.display()))?;
        let decoder = MultiBzDecoder::new(BufReader::new(file));
        let reader = Reader::from_reader(BufReader::new(decoder));
        Ok(Self {
            reader,
            buf: Vec::with_capacity(64 * 1024),
            pages_read: 0,
            pages_faulty: 0,
            pages_skipped: 0,
        })
    }

    /// Next main-namespace article page, or `None` at end of dump.
    ///
    /// XML-level errors are unrecoverable in a pull parser and abort the
    /// stream; per-page semantic faults (missing title, unparsable ns) are
    /// counted and the page skipped.
    pub fn next_page(&mut self) -> Result<Option<Page>> {
        let mut in_page = false;
        let mut field = Field::None;
        let mut title = String::new();
        let mut ns: i64 = 0;
        let mut ns_raw = String::new();
        let mut id_raw = String::new();
        let mut id: Option<u64> = None;
        let mut text = String::new();

        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .context("malformed dump: XML stream unreadable")?;

            match event {
                Event::Start(e) => match e.name().as_ref() {
                    b"page" => {
                        in_page = true;
                        title.clear();
                        ns = 0;
                        id = None;
                        text.clear();
                    }
                    b"title" if in_page => field = Field::Title,
                    b"ns" if in_page => {
                        ns_raw.clear();
                        field = Field::Ns;
                    }
                    // the first <id> under <page> is the page id; revision
                    // and contributor ids come later and are ignored
                    b"id" if in_page && id.is_none() => {
                        id_raw.clear();
                        field = Field::Id;
                    }
                    b"text" if in_page => field = Field::Text,
                    _ => field = Field::None,
                },
                Event::Text(e) => {
                    let chunk = e
                        .unescape()
                        .context("malformed dump: undecodable text node")?;
                    match field {
                        Field::Title => title.push_str(&chunk),
                        Field::Ns => ns_raw.push_str(&chunk),
                        Field::Id => id_raw.push_str(&chunk),
                        Field::Text => text.push_str(&chunk),
                        Field::None => {}
                    }
                }
                Event::End(e) => match e.name().as_ref() {
                    b"page" => {
                        in_page = false;
                        if title.is_empty() {
                            self.pages_faulty += 1;
                            warn!("skipping page without title (id {id:?})");
                            continue;
                        }
                        if ns != 0 || !is_article_title(&title) {
                            // ns < 0 marks a fault already counted above
                            if ns >= 0 {
                                self.pages_skipped += 1;
                            }
                            continue;
                        }
                        self.pages_read += 1;
                        return Ok(Some(Page {
                            id: id.unwrap_or_default(),
                            title: std::mem::take(&mut title),
                            text: std::mem::take(&mut text),
                        }));
                    }
                    b"ns" => {
                        match ns_raw.trim().parse() {
                            Ok(parsed) => ns = parsed,
                            Err(_) => {
                                self.pages_faulty += 1;
                                warn!("page '{title}': unparsable namespace '{ns_raw}'");
                                ns = -1; // drop the page at </page>
                            }
                        }
                        field = Field::None;
                    }
                    b"id" => {
                        if id.is_none() {
                            id = id_raw.trim().parse().ok();
                        }
                        field = Field::None;
                    }
                    _ => field = Field::None,
                },
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for DumpReader {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_page().transpose()
    }
}
