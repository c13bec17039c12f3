//! Default fortunes used to seed a ledger whose store has never been written.
//!
//! The seed file is plain text with fortunes separated by `===`. Line breaks
//! inside a fortune are dropped.

use std::io;
use std::path::Path;

pub const SEPARATOR: &str = "===";

pub fn parse(contents: &str) -> Vec<String> {
    contents
        .split(SEPARATOR)
        .map(|chunk| chunk.replace(['\n', '\r'], "").trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Read a seed file. A missing file means "no defaults".
pub fn read(path: &Path) -> io::Result<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(parse(&contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}
