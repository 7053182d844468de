/// Document format classification based on file extensions.
///
/// The extension is the only signal: no content sniffing is performed, so a
/// renamed file is classified by its name alone.
use compact_str::CompactString;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// The document families LockSleuth knows how to check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Zip,
    Office,
    Unsupported,
}

impl DocumentFormat {
    /// Human-readable label for reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Zip => "zip",
            Self::Office => "office",
            Self::Unsupported => "unsupported",
        }
    }

    /// `true` for every format that has a detector.
    pub fn is_supported(self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Longest extension we recognise ("docx", "pptm", ...).
const MAX_KNOWN_EXT_LEN: usize = 4;

/// Classify a bare extension (without the leading dot).
///
/// Zero-heap-allocation: the extension is lowercased into a small stack
/// buffer. Anything longer than the longest known extension is rejected
/// before lowering.
pub fn classify_extension(ext: &str) -> DocumentFormat {
    let bytes = ext.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_KNOWN_EXT_LEN {
        return DocumentFormat::Unsupported;
    }

    let mut lower = [0u8; MAX_KNOWN_EXT_LEN];
    for (dest, &src) in lower.iter_mut().zip(bytes.iter()) {
        *dest = src.to_ascii_lowercase();
    }

    match &lower[..bytes.len()] {
        b"pdf" => DocumentFormat::Pdf,
        b"zip" => DocumentFormat::Zip,
        b"docx" | b"xlsx" | b"pptx" | b"docm" | b"xlsm" | b"pptm" | b"xls" | b"doc" => {
            DocumentFormat::Office
        }
        _ => DocumentFormat::Unsupported,
    }
}

/// Classify a path by its final extension.
pub fn classify_path(path: &Path) -> DocumentFormat {
    path.extension()
        .and_then(|e| e.to_str())
        .map(classify_extension)
        .unwrap_or(DocumentFormat::Unsupported)
}

/// A discovered file that is about to be checked.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Lower-cased extension, without the dot. Empty when the file has none.
    pub extension: CompactString,
    pub format: DocumentFormat,
}

impl FileCandidate {
    /// Build a candidate from an absolute path.
    pub fn new(path: PathBuf) -> Self {
        let extension = path
            .extension()
            .map(|e| CompactString::new(e.to_string_lossy().to_ascii_lowercase()))
            .unwrap_or_default();
        let format = classify_extension(&extension);
        Self {
            path,
            extension,
            format,
        }
    }
}
