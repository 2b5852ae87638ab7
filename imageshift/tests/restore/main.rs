use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

datatest_stable::harness! {
    { test = test, root = "tests/restore/testdata", pattern = r".*/input.yaml" },
}

fn test(path: &Path) -> datatest_stable::Result<()> {
    let input = std::fs::read_to_string(path).context("reading input manifests")?;

    let mut out = Vec::new();
    imageshift::restore_manifests(&input, &mut out)?;
    let actual = String::from_utf8(out)?;

    let expected_path = path.with_file_name("expected.yaml");
    let expected = std::fs::read_to_string(&expected_path)
        .with_context(|| format!("reading {}", expected_path.display()))?;

    // Documents must match in order and content; formatting and key order
    // within a document do not matter.
    if parse_documents(&expected)? == parse_documents(&actual)? {
        return Ok(());
    }

    let chunks = dissimilar::diff(&expected, &actual);
    eprintln!(
        "Restore output mismatch for {}:\n{}",
        path.display(),
        format_chunks(chunks)
    );

    Err(format!("restore output mismatch for {}", path.display()).into())
}

fn parse_documents(s: &str) -> anyhow::Result<Vec<serde_yaml::Value>> {
    serde_yaml::Deserializer::from_str(s)
        .map(|doc| serde_yaml::Value::deserialize(doc).context("parsing YAML document"))
        .collect()
}

fn format_chunks(chunks: Vec<dissimilar::Chunk>) -> String {
    let mut buf = String::new();
    for chunk in chunks {
        let formatted = match chunk {
            dissimilar::Chunk::Equal(text) => text.into(),
            dissimilar::Chunk::Delete(text) => format!("\x1b[4m\x1b[31m{}\x1b[0m", text),
            dissimilar::Chunk::Insert(text) => format!("\x1b[4m\x1b[32m{}\x1b[0m", text),
        };
        buf.push_str(&formatted);
    }
    buf
}
