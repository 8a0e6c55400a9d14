//! Document loader
//!
//! Turns raw bytes (or a file on disk) into a JSON object. Loading never fails
//! from the caller's point of view: problems are collected as strings in the
//! returned [`LoadOutcome`], and a file that cannot be used at all simply has no
//! document.
//!
//! **Algorithm:**
//! 1. Gzip input (by `.gz` name or magic bytes) is decompressed first
//! 2. Text is decoded as UTF-8, then CP949 (legacy Korean), then lossy UTF-8
//! 3. The whole text is parsed as one JSON value; an object is returned as-is,
//!    anything else is wrapped as `{"root": value}`
//! 4. If that fails, or the name marks the file as line-delimited, each non-blank
//!    line is parsed on its own; bad lines are skipped and recorded, good lines
//!    become `{"records": [...]}`
//! 5. If nothing parsed, the outcome has no document and carries every error

use flate2::read::GzDecoder;
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// UTF-8 byte-order mark
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// How the returned document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentLayout {
    /// Whole text parsed to an object
    Object,
    /// Whole text parsed to a non-object, wrapped as `{"root": value}`
    WrappedRoot,
    /// Line-delimited input, wrapped as `{"records": [...]}`
    Records,
}

/// Text encoding that decoded the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf8,
    /// CP949 / EUC-KR legacy fallback
    Cp949,
    /// UTF-8 with invalid sequences replaced
    Utf8Lossy,
}

/// Result of loading one source
#[derive(Debug, Clone, Serialize)]
pub struct LoadOutcome {
    /// Source name (file name or caller-supplied label)
    pub source: String,
    /// Loaded document; `None` means the source is unusable
    pub document: Option<Map<String, Value>>,
    /// How the document was obtained (`None` when unusable)
    pub layout: Option<DocumentLayout>,
    /// Encoding that decoded the text (`None` when decompression failed)
    pub encoding: Option<TextEncoding>,
    /// Recoverable and fatal problems, in the order they were met
    pub errors: Vec<String>,
    /// Informational notes (wrapping, encoding fallback)
    pub notes: Vec<String>,
}

impl LoadOutcome {
    fn unusable(source: &str, errors: Vec<String>) -> Self {
        Self {
            source: source.to_string(),
            document: None,
            layout: None,
            encoding: None,
            errors,
            notes: Vec::new(),
        }
    }

    /// True when a document was produced
    pub fn is_usable(&self) -> bool {
        self.document.is_some()
    }

    /// Documents to feed to the subject index, in order
    ///
    /// Line-delimited sources yield one entry per record (non-objects are
    /// `Err` with their 1-based record position); other layouts yield the
    /// document itself.
    pub fn merge_units(&self) -> Vec<std::result::Result<&Map<String, Value>, usize>> {
        let Some(doc) = &self.document else {
            return Vec::new();
        };
        match (self.layout, doc.get("records")) {
            (Some(DocumentLayout::Records), Some(Value::Array(records))) => records
                .iter()
                .enumerate()
                .map(|(i, record)| match record {
                    Value::Object(map) => Ok(map),
                    _ => Err(i + 1),
                })
                .collect(),
            _ => vec![Ok(doc)],
        }
    }
}

/// True when the name carries a gzip extension
pub fn is_compressed_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".gz")
}

/// True when the name marks line-delimited JSON (`.jsonl`, `.ndjson`, optionally gzipped)
pub fn is_line_delimited_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let stem = lower.strip_suffix(".gz").unwrap_or(&lower);
    stem.ends_with(".jsonl") || stem.ends_with(".ndjson")
}

/// True for every accepted input extension
pub fn is_supported_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    let stem = lower.strip_suffix(".gz").unwrap_or(&lower);
    stem.ends_with(".json") || stem.ends_with(".jsonl") || stem.ends_with(".ndjson")
}

/// File name without its data extensions (`S1_pad.json.gz` → `S1_pad`)
///
/// Used as the fallback subject id.
pub fn source_stem(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let mut stem = base.as_str();
    for ext in [".gz", ".json", ".jsonl", ".ndjson"] {
        if stem.len() > ext.len() && stem.to_ascii_lowercase().ends_with(ext) {
            stem = &stem[..stem.len() - ext.len()];
        }
    }
    stem.to_string()
}

/// Load a file from disk
///
/// Read failures are reported in the outcome, never returned as `Err`.
pub fn load_path(path: &Path) -> LoadOutcome {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match std::fs::read(path) {
        Ok(bytes) => load_bytes(&name, &bytes),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read input file");
            LoadOutcome::unusable(&name, vec![format!("load error: {}", e)])
        }
    }
}

/// Load a document from raw bytes
///
/// `name` drives extension-based decisions (gzip, line-delimited) and is
/// recorded as the outcome's source.
pub fn load_bytes(name: &str, bytes: &[u8]) -> LoadOutcome {
    let raw: Cow<[u8]> = if is_compressed_name(name) || bytes.starts_with(&GZIP_MAGIC) {
        match gunzip(bytes) {
            Ok(inflated) => Cow::Owned(inflated),
            Err(e) => {
                warn!(source = name, error = %e, "Gzip decompression failed");
                return LoadOutcome::unusable(name, vec![format!("decompress error: {}", e)]);
            }
        }
    } else {
        Cow::Borrowed(bytes)
    };

    let (text, encoding) = decode_text(&raw);
    let mut outcome = LoadOutcome {
        source: name.to_string(),
        document: None,
        layout: None,
        encoding: Some(encoding),
        errors: Vec::new(),
        notes: Vec::new(),
    };
    match encoding {
        TextEncoding::Utf8 => {}
        TextEncoding::Cp949 => outcome.notes.push("decoded as cp949".to_string()),
        TextEncoding::Utf8Lossy => {
            warn!(source = name, "Input is neither UTF-8 nor CP949, decoded lossily");
            outcome
                .notes
                .push("decoded as utf-8 with replacement characters".to_string());
        }
    }

    let mut document_error = None;
    if !is_line_delimited_name(name) {
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => {
                outcome.document = Some(map);
                outcome.layout = Some(DocumentLayout::Object);
                return outcome;
            }
            Ok(other) => {
                let mut wrapped = Map::new();
                wrapped.insert("root".to_string(), other);
                outcome.document = Some(wrapped);
                outcome.layout = Some(DocumentLayout::WrappedRoot);
                outcome
                    .notes
                    .push("top-level value is not an object, wrapped as {\"root\": ...}".to_string());
                return outcome;
            }
            Err(e) => {
                debug!(source = name, error = %e, "Whole-document parse failed, trying line-delimited");
                document_error = Some(format!("document parse error: {}", e));
            }
        }
    }

    let (records, line_errors) = parse_lines(&text);
    if !line_errors.is_empty() {
        warn!(
            source = name,
            skipped = line_errors.len(),
            parsed = records.len(),
            "Skipped malformed lines"
        );
    }
    outcome.errors.extend(line_errors);

    if records.is_empty() {
        if let Some(e) = document_error {
            outcome.errors.insert(0, e);
        }
        if outcome.errors.is_empty() {
            outcome.errors.push("no JSON content found".to_string());
        }
        return outcome;
    }

    let mut wrapped = Map::new();
    wrapped.insert("records".to_string(), Value::Array(records));
    outcome.document = Some(wrapped);
    outcome.layout = Some(DocumentLayout::Records);
    outcome
}

fn gunzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(bytes);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated)?;
    Ok(inflated)
}

/// Decode text: UTF-8 (BOM stripped), then CP949, then lossy UTF-8
fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, TextEncoding) {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (Cow::Borrowed(text), TextEncoding::Utf8);
    }
    if let Some(text) = encoding_rs::EUC_KR.decode_without_bom_handling_and_without_replacement(bytes) {
        return (text, TextEncoding::Cp949);
    }
    (String::from_utf8_lossy(bytes), TextEncoding::Utf8Lossy)
}

/// Parse every non-blank line; errors reference 1-based line numbers
fn parse_lines(text: &str) -> (Vec<Value>, Vec<String>) {
    let mut records = Vec::new();
    let mut errors = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => records.push(value),
            Err(e) => errors.push(format!("line {} parse error: {}", i + 1, e)),
        }
    }
    (records, errors)
}
