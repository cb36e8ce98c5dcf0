use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use super::open_output;

/// Serialize `value` as pretty printed JSON to `writer`, followed by a newline.
pub fn write_json<T: Serialize, W: Write>(value: &T, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value).context("Could not serialize json")?;
    writeln!(writer).context("Could not write json")?;
    writer.flush().context("Could not flush json")?;
    Ok(())
}

/// Write `value` as JSON to the file at `path`, or to stdout if no path is given.
pub fn write_json_to<T: Serialize>(value: &T, path: Option<&str>) -> Result<()> {
    let writer = open_output(path)?;
    write_json(value, writer).with_context(|| {
        format!("Could not write json to {}", path.unwrap_or("stdout"))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::RunSummary;

    #[test]
    fn summary_as_json() {
        let summary = RunSummary {
            total: 3,
            unchanged: 1,
            realigned: 1,
            exhausted: 0,
            failed: 1,
            skipped: 0,
        };
        let mut out = Vec::new();
        write_json(&summary, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(3, value["total"]);
        assert_eq!(1, value["failed"]);
    }

    #[test]
    fn repeats_as_json() {
        let counts = BTreeMap::from([("AC".to_owned(), 3)]);
        let mut out = Vec::new();
        write_json(&counts, &mut out).unwrap();

        assert_eq!("{\n  \"AC\": 3\n}\n", String::from_utf8(out).unwrap());
    }
}
