//! Document selection: validate a local PDF before it is uploaded.
//!
//! The server only accepts PDFs, and an upload is slow (the whole document is
//! embedded before the response comes back), so the file is checked locally
//! first: it must exist, be readable, and start with the `%PDF` magic bytes.
//! Failing early gives a precise error instead of an opaque 500 minutes later.

use crate::error::PdfQaError;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A local PDF that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDocument {
    pub path: PathBuf,
    /// File name sent in the multipart upload.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

/// Validate `path` as an uploadable PDF.
pub fn select_document(path: impl AsRef<Path>) -> Result<SelectedDocument, PdfQaError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(PdfQaError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PdfQaError::PermissionDenied { path });
        }
        Err(_) => return Err(PdfQaError::FileNotFound { path }),
    };

    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) if &magic == b"%PDF" => {}
        Ok(()) => return Err(PdfQaError::NotAPdf { path, magic }),
        // Shorter than four bytes: cannot be a PDF either.
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(PdfQaError::NotAPdf { path, magic });
        }
        Err(source) => return Err(PdfQaError::Io { path, source }),
    }

    let size = file
        .metadata()
        .map_err(|source| PdfQaError::Io {
            path: path.clone(),
            source,
        })?
        .len();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    debug!("Selected PDF: {} ({})", path.display(), format_file_size(size));
    Ok(SelectedDocument { path, name, size })
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2 MB`, `1.25 GB`.
///
/// Base 1024, at most two decimals, trailing zeros dropped. Sizes beyond
/// gigabytes are still expressed in GB.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut scale = 1u64;
    while unit < UNITS.len() - 1 && bytes >= scale * 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = bytes as f64 / scale as f64;
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

/// Last segment of a server-side path, whichever separator the server uses.
pub fn display_name(server_path: &str) -> &str {
    server_path
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(server_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(1), "1 Bytes");
        assert_eq!(format_file_size(1023), "1023 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(1_048_576), "1 MB");
        assert_eq!(format_file_size(1_572_864), "1.5 MB");
        assert_eq!(format_file_size(1_073_741_824), "1 GB");
        assert_eq!(format_file_size(5 * 1_099_511_627_776), "5120 GB");
    }

    #[test]
    fn test_format_file_size_rounds_to_two_places() {
        // 1234 / 1024 = 1.205078…
        assert_eq!(format_file_size(1234), "1.21 KB");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("uploads/report.pdf"), "report.pdf");
        assert_eq!(display_name("uploads\\report.pdf"), "report.pdf");
        assert_eq!(display_name("C:\\data/up\\x.pdf"), "x.pdf");
        assert_eq!(display_name("plain.pdf"), "plain.pdf");
    }

    #[test]
    fn test_select_valid_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%PDF-1.7\n%%EOF\n").unwrap();

        let doc = select_document(&path).unwrap();
        assert_eq!(doc.name, "paper.pdf");
        assert_eq!(doc.size, 15);
    }

    #[test]
    fn test_select_missing_file() {
        let err = select_document("/definitely/not/here.pdf").unwrap_err();
        assert!(matches!(err, PdfQaError::FileNotFound { .. }));
    }

    #[test]
    fn test_select_not_a_pdf() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        let err = select_document(f.path()).unwrap_err();
        match err {
            PdfQaError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn test_select_tiny_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%P").unwrap();
        assert!(matches!(
            select_document(f.path()),
            Err(PdfQaError::NotAPdf { .. })
        ));
    }
}
