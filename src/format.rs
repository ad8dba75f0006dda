//! Gridsift - Input formats
//!
//! Turns a file (or stdin) into a [`Dataset`]. Delimited files become raw
//! records whose first entry is the header; JSON Lines files become
//! string-keyed records. Files are memory-mapped before parsing.

use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::data::Dataset;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma-separated values, first record is the header
    Csv,
    /// Tab-separated values, first record is the header
    Tsv,
    /// JSON Lines, one flat object per line
    Jsonl,
}

impl InputFormat {
    /// Detect format from file extension
    pub fn detect<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("tsv") | Some("tab") => InputFormat::Tsv,
            Some("jsonl") | Some("ndjson") | Some("json") => InputFormat::Jsonl,
            _ => InputFormat::Csv, // Default to CSV
        }
    }

    /// Parse format from string (for CLI)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(InputFormat::Csv),
            "tsv" | "tab" => Some(InputFormat::Tsv),
            "jsonl" | "json" | "ndjson" => Some(InputFormat::Jsonl),
            _ => None,
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            InputFormat::Tsv => b'\t',
            _ => b',',
        }
    }
}

/// Raw bytes of the input
enum SourceBytes {
    /// Memory-mapped file
    Mmap(Mmap),
    /// In-memory buffer (stdin, empty files)
    InMemory(Vec<u8>),
}

impl SourceBytes {
    fn as_bytes(&self) -> &[u8] {
        match self {
            SourceBytes::Mmap(m) => m.as_ref(),
            SourceBytes::InMemory(v) => v.as_slice(),
        }
    }

    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;
        let size = file.metadata()?.len();
        if size == 0 {
            return Ok(SourceBytes::InMemory(Vec::new()));
        }
        // The map is read-only and dropped once parsing is done
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(SourceBytes::Mmap(mmap))
    }

    fn stdin() -> Result<Self> {
        let mut buffer = Vec::new();
        io::stdin().lock().read_to_end(&mut buffer)?;
        Ok(SourceBytes::InMemory(buffer))
    }
}

/// Load a dataset from `path`; `-` reads stdin.
///
/// `format` overrides extension-based detection.
pub fn load_dataset(path: &str, format: Option<InputFormat>) -> Result<Dataset> {
    let (bytes, format) = if path == "-" {
        (SourceBytes::stdin()?, format.unwrap_or(InputFormat::Csv))
    } else {
        let p = Path::new(path);
        (SourceBytes::open(p)?, format.unwrap_or_else(|| InputFormat::detect(p)))
    };

    let source = if path == "-" { "<stdin>" } else { path };
    let dataset = parse_bytes(bytes.as_bytes(), format)
        .with_context(|| format!("Failed to parse {}", source))?;
    Ok(dataset.with_source(source))
}

/// Parse an in-memory buffer
pub fn parse_bytes(bytes: &[u8], format: InputFormat) -> Result<Dataset> {
    match format {
        InputFormat::Csv | InputFormat::Tsv => {
            read_delimited(bytes, format.delimiter()).map(Dataset::from_records)
        }
        InputFormat::Jsonl => read_jsonl(bytes).map(Dataset::from_maps),
    }
}

/// Read every record, header included, allowing ragged rows
pub fn read_delimited(bytes: &[u8], delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read record {}", i + 1))?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}

/// Read JSON Lines into ordered key/value records
pub fn read_jsonl(bytes: &[u8]) -> Result<Vec<Vec<(String, Option<String>)>>> {
    let text = std::str::from_utf8(bytes).with_context(|| "Invalid UTF-8 in JSONL input")?;
    let mut records = Vec::new();

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("Invalid JSON on line {}", i + 1))?;
        let serde_json::Value::Object(obj) = value else {
            bail!("Line {} is not a JSON object", i + 1);
        };
        records.push(
            obj.into_iter()
                .map(|(key, value)| (key, cell_text(value)))
                .collect(),
        );
    }

    Ok(records)
}

/// String form of a JSON value; `null` is an absent cell
fn cell_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_detect_format() {
        assert_eq!(InputFormat::detect("data.csv"), InputFormat::Csv);
        assert_eq!(InputFormat::detect("data.TSV"), InputFormat::Tsv);
        assert_eq!(InputFormat::detect("data.jsonl"), InputFormat::Jsonl);
        assert_eq!(InputFormat::detect("data.txt"), InputFormat::Csv); // Default
        assert_eq!(InputFormat::detect("data"), InputFormat::Csv); // No extension
    }

    #[test]
    fn test_parse() {
        assert_eq!(InputFormat::parse("CSV"), Some(InputFormat::Csv));
        assert_eq!(InputFormat::parse("tab"), Some(InputFormat::Tsv));
        assert_eq!(InputFormat::parse("ndjson"), Some(InputFormat::Jsonl));
        assert_eq!(InputFormat::parse("parquet"), None);
    }

    #[test]
    fn test_ragged_csv() -> Result<()> {
        let records = read_delimited(b"a,b\n1\n2,3,4\n", b',')?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[1], vec!["1"]);
        assert_eq!(records[2].len(), 3);
        Ok(())
    }

    #[test]
    fn test_quoted_fields() -> Result<()> {
        let ds = parse_bytes(b"name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n", InputFormat::Csv)?;
        assert_eq!(ds.rows()[0].cell(0), Some("Smith, J"));
        assert_eq!(ds.rows()[0].cell(1), Some("said \"hi\""));
        Ok(())
    }

    #[test]
    fn test_jsonl_records() -> Result<()> {
        let input = b"{\"name\":\"Alice\",\"age\":30}\n\n{\"age\":null,\"name\":\"Bob\",\"tags\":[1]}\n";
        let ds = parse_bytes(input, InputFormat::Jsonl)?;
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.columns()[1].name, "age");
        assert_eq!(ds.columns()[1].kind, ColumnKind::Numeric);
        assert_eq!(ds.rows()[1].cell(1), None);
        assert_eq!(ds.rows()[1].cell(2), Some("[1]"));
        Ok(())
    }

    #[test]
    fn test_jsonl_rejects_non_objects() {
        assert!(parse_bytes(b"[1,2]\n", InputFormat::Jsonl).is_err());
        assert!(parse_bytes(b"{oops\n", InputFormat::Jsonl).is_err());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "name\tage")?;
        writeln!(file, "Alice\t30")?;
        writeln!(file, "Bob\t25")?;
        let path = file.path().to_string_lossy().to_string();

        let ds = load_dataset(&path, Some(InputFormat::Tsv))?;
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.source, path);
        assert_eq!(ds.rows()[1].cell(1), Some("25"));
        Ok(())
    }

    #[test]
    fn test_load_empty_file() -> Result<()> {
        let file = NamedTempFile::new()?;
        let ds = load_dataset(&file.path().to_string_lossy(), None)?;
        assert!(ds.is_empty());
        assert!(ds.columns().is_empty());
        Ok(())
    }
}
