//! Streaming reader for the gzipped `langlinks` SQL dump.
//!
//! The dump is a sequence of very long `INSERT INTO \`langlinks\` VALUES
//! (...),(...);` statements. A row is `(ll_from, 'll_lang', 'll_title')`
//! where `ll_from` is the linking page's id. The scanner walks the
//! decompressed byte stream once, honouring quoted strings and backslash
//! escapes, and never loads a whole statement into memory.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

/// One langlink row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanglinkRow {
    pub from_id: u64,
    pub lang: String,
    pub title: String,
}

enum ScanState {
    /// Between rows, waiting for `(`.
    Outside,
    /// Inside a `(...)` tuple, outside quotes.
    Tuple,
    /// Inside a quoted string.
    Quoted,
    /// Just saw a backslash inside a quoted string.
    Escaped,
}

pub struct LanglinkReader {
    reader: BufReader<GzDecoder<BufReader<File>>>,
    chunk: [u8; 64 * 1024],
    /// Unconsumed tail of the current chunk.
    pending: Vec<u8>,
    pending_pos: usize,
    state: ScanState,
    /// Set between a `VALUES` keyword and the closing `;`, so the parens of
    /// `CREATE TABLE (...)` never start a tuple.
    in_values: bool,
    keyword_window: [u8; 6],
    fields: Vec<String>,
    current: Vec<u8>,
    /// Rows whose shape did not match `(int, str, str)`.
    pub rows_faulty: u64,
}

impl LanglinkReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening langlinks dump {}", path.display()))?;
        let decoder = GzDecoder::new(BufReader::new(file));
        Ok(Self {
            reader: BufReader::new(decoder),
            chunk: [0; 64 * 1024],
            pending: Vec::new(),
            pending_pos: 0,
            state: ScanState::Outside,
            in_values: false,
            keyword_window: [0; 6],
            fields: Vec::new(),
            current: Vec::new(),
            rows_faulty: 0,
        })
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        if self.pending_pos >= self.pending.len() {
            let n = self
                .reader
                .read(&mut self.chunk)
                .context("reading langlinks dump")?;
            if n == 0 {
                return Ok(None);
            }
            self.pending.clear();
            self.pending.extend_from_slice(&self.chunk[..n]);
            self.pending_pos = 0;
        }
        let byte = self.pending[self.pending_pos];
        self.pending_pos += 1;
        Ok(Some(byte))
    }

    fn finish_field(&mut self) {
        let field = String::from_utf8_lossy(&self.current).into_owned();
        self.fields.push(field);
        self.current.clear();
    }

    /// Next syntactic `(...)` tuple as raw fields, or `None` at EOF.
    fn next_tuple(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            let Some(byte) = self.next_byte()? else {
                return Ok(None);
            };

            match self.state {
                ScanState::Outside => {
                    self.keyword_window.rotate_left(1);
                    self.keyword_window[5] = byte.to_ascii_uppercase();
                    if &self.keyword_window == b"VALUES" {
                        self.in_values = true;
                    } else if byte == b';' {
                        self.in_values = false;
                    } else if byte == b'(' && self.in_values {
                        self.state = ScanState::Tuple;
                        self.fields.clear();
                        self.current.clear();
                    }
                }
                ScanState::Tuple => match byte {
                    b'\'' => self.state = ScanState::Quoted,
                    b',' => self.finish_field(),
                    b')' => {
                        self.finish_field();
                        self.state = ScanState::Outside;
                        return Ok(Some(std::mem::take(&mut self.fields)));
                    }
                    b if b.is_ascii_whitespace() => {}
                    b => self.current.push(b),
                },
                ScanState::Quoted => match byte {
                    b'\\' => self.state = ScanState::Escaped,
                    b'\'' => self.state = ScanState::Tuple,
                    b => self.current.push(b),
                },
                ScanState::Escaped => {
                    self.current.push(byte);
                    self.state = ScanState::Quoted;
                }
            }
        }
    }

    /// Next well-formed langlink row. Malformed tuples are counted and
    /// skipped; stream-level errors abort.
    pub fn next_row(&mut self) -> Result<Option<LanglinkRow>> {
        loop {
            let Some(fields) = self.next_tuple()? else {
                return Ok(None);
            };
            if fields.len() != 3 {
                self.rows_faulty += 1;
                continue;
            }
            let Ok(from_id) = fields[0].trim().parse::<u64>() else {
                self.rows_faulty += 1;
                continue;
            };
            // MediaWiki stores titles with underscores for spaces
            let title = fields[2].replace('_', " ");
            return Ok(Some(LanglinkRow {
                from_id,
                lang: fields[1].clone(),
                title,
            }));
        }
    }
}

impl Iterator for LanglinkReader {
    type Item = Result<LanglinkRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn write_sql(path: &Path, sql: &str) {
        let file = File::create(path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(sql.as_bytes()).unwrap();
        encoder.finish().unwrap();
    }

    #[test]
    fn parses_insert_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("langlinks.sql.gz");
        write_sql(
            &path,
            "-- MySQL dump\n\
             CREATE TABLE `langlinks` (\n  `ll_from` int(8) NOT NULL DEFAULT 0\n);\n\
             INSERT INTO `langlinks` VALUES (1,'eo','Hundo'),(2,'en','Dog'),(3,'eo','Granda_urbo');\n",
        );

        let reader = LanglinkReader::open(&path).unwrap();
        let rows: Vec<_> = reader.map(Result::unwrap).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].from_id, 1);
        assert_eq!(rows[0].lang, "eo");
        assert_eq!(rows[0].title, "Hundo");
        assert_eq!(rows[2].title, "Granda urbo");
    }

    #[test]
    fn quoted_commas_and_escapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("langlinks.sql.gz");
        write_sql(
            &path,
            "INSERT INTO `langlinks` VALUES (7,'eo','Urbo, granda'),(8,'eo','L\\'urbo');\n",
        );

        let reader = LanglinkReader::open(&path).unwrap();
        let rows: Vec<_> = reader.map(Result::unwrap).collect();
        assert_eq!(rows[0].title, "Urbo, granda");
        assert_eq!(rows[1].title, "L'urbo");
    }

    #[test]
    fn malformed_tuples_are_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("langlinks.sql.gz");
        write_sql(
            &path,
            "INSERT INTO `langlinks` VALUES (1,'eo','Hundo'),(bad,'eo','X'),(2,'eo');\n",
        );

        let mut reader = LanglinkReader::open(&path).unwrap();
        let mut rows = Vec::new();
        while let Some(row) = reader.next_row().unwrap() {
            rows.push(row);
        }
        assert_eq!(rows.len(), 1);
        assert_eq!(reader.rows_faulty, 2);
    }
}
