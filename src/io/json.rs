use std::{fs::{self, File}, io::{BufWriter, Write}, path::Path};

use anyhow::{bail, Context, Result};
use serde::Serialize;

/// Write `value` as pretty JSON to `path`. An existing file is only replaced when `force` is set.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, force: bool) -> Result<()> {
    if path == Path::new("-") { bail!("[io::json] Use no --output to print to stdout") }
    if path.exists() && !force {
        bail!("[io::json] Output file already exists (use --force to overwrite): {}", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("[io::json] Failed to create directory {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("[io::json] Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("[io::json] Failed to serialize report to {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write a report to `output`, or print it to stdout when no path is given.
pub fn write_report<T: Serialize + ?Sized>(output: Option<&Path>, value: &T, force: bool) -> Result<()> {
    match output {
        Some(path) => write_json(path, value, force),
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            serde_json::to_writer_pretty(&mut lock, value).context("[io::json] Failed to write report")?;
            writeln!(lock)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        write_json(&path, &json!({ "n": 1 }), false).unwrap();
        let err = write_json(&path, &json!({ "n": 2 }), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        write_json(&path, &json!({ "n": 3 }), true).unwrap();
        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["n"], 3);
    }
}
