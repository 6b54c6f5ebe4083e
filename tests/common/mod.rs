//! Shared gzip NDJSON fixtures for the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;

#[derive(Serialize)]
struct Event {
    actor: String,
    other: usize,
    payload: String,
}

/// Write `lines` to `path` as a gzip-compressed newline-delimited file.
pub fn write_gz_lines(path: &Path, lines: &[String]) -> anyhow::Result<()> {
    let mut encoder = GzEncoder::new(File::create(path)?, Compression::default());
    for line in lines {
        encoder.write_all(line.as_bytes())?;
        encoder.write_all(b"\n")?;
    }
    encoder.finish()?;
    Ok(())
}

/// Decompress `path` and return its lines.
pub fn read_gz_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let reader = BufReader::new(GzDecoder::new(File::open(path)?));
    Ok(reader.lines().collect::<std::io::Result<_>>()?)
}

/// The three-record example scenario from the harness contract.
pub fn sample_events() -> Vec<String> {
    vec![
        r#"{"actor":"a1","other":1}"#.to_string(),
        r#"{"actor":"a2","other":2}"#.to_string(),
        r#"{"actor":"a3","other":3}"#.to_string(),
    ]
}

/// Expected projection of [`sample_events`] on the `actor` field.
pub fn sample_projected() -> Vec<String> {
    vec![r#""a1""#.to_string(), r#""a2""#.to_string(), r#""a3""#.to_string()]
}

/// `n` well-formed records, large enough in aggregate to exceed OS pipe
/// buffers when `n` is tens of thousands.
pub fn bulk_events(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            serde_json::to_string(&Event {
                actor: format!("user-{i}"),
                other: i,
                payload: "x".repeat(32),
            })
            .expect("serialize fixture event")
        })
        .collect()
}
