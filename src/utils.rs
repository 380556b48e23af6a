use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

fn artifact_size(path: &Path) -> Option<u64> {
    let md = fs::metadata(path).ok()?;
    md.is_file().then(|| md.len())
}

/// One console line per written artifact: message, path, size. Stage
/// outputs are flat files; the odd directory target (the reports dir, a
/// just-removed path) prints without a size.
pub fn pretty_println_at_path(msg: &str, path: &Path) {
    let at = "\x1b[1;36m@\x1b[0m"; // bold + cyan
    match artifact_size(path) {
        Some(bytes) => {
            let mb = bytes as f64 / (1024.0 * 1024.0);
            let size = format!("\x1b[1m{mb:.2} MB\x1b[0m"); // bold
            println!("{msg} {at} {} ({size})", path.display());
        }
        None => println!("{msg} {at} {}", path.display()),
    }
}

/// Write bytes with write-then-rename semantics so a partially written
/// artifact is never observed as newer than its inputs.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let file = File::create(&tmp)
            .with_context(|| format!("creating temp file for {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming temp file onto {}", path.display()))?;
    Ok(())
}

/// Serialize one value per line, atomically.
pub fn write_jsonl<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    let mut bytes = Vec::new();
    for item in items {
        serde_json::to_writer(&mut bytes, item)?;
        bytes.push(b'\n');
    }
    write_atomic(path, &bytes)
}

/// Read a JSONL artifact back into memory.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file =
        File::open(path).with_context(|| format!("opening artifact {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut items = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let item = serde_json::from_str(&line).with_context(|| {
            format!("decoding JSON line {} of {}", line_number + 1, path.display())
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Serialize a whole value as (pretty) JSON, atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let bytes = if pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    write_atomic(path, &bytes)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file =
        File::open(path).with_context(|| format!("opening artifact {}", path.display()))?;
    let value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("decoding JSON at {}", path.display()))?;
    Ok(value)
}
