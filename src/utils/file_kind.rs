use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "webp", "svg",
    "tiff", "tif", "heic", "heif", "avif",
];

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods", "csv", "tsv"];

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "doc", "docx", "odt", "rtf", "txt", "md", "ppt", "pptx", "odp",
];

const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "bz2", "7z", "rar"];

/// Coarse file classification, used for result-list icons and preview support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Folder,
    Pdf,
    Image,
    Spreadsheet,
    Document,
    Archive,
    Other,
}

impl FileKind {
    /// Classifies by extension only; never touches the disk.
    pub fn from_path(path: &Path, is_directory: bool) -> Self {
        if is_directory {
            return FileKind::Folder;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return FileKind::Other;
        };
        let ext = ext.to_lowercase();
        let ext = ext.as_str();
        if ext == "pdf" {
            FileKind::Pdf
        } else if IMAGE_EXTENSIONS.contains(&ext) {
            FileKind::Image
        } else if SPREADSHEET_EXTENSIONS.contains(&ext) {
            FileKind::Spreadsheet
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            FileKind::Document
        } else if ARCHIVE_EXTENSIONS.contains(&ext) {
            FileKind::Archive
        } else {
            FileKind::Other
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            FileKind::Folder => "📁",
            FileKind::Pdf => "📕",
            FileKind::Image => "🖼️",
            FileKind::Spreadsheet => "📊",
            FileKind::Document => "📝",
            FileKind::Archive => "🗜️",
            FileKind::Other => "📄",
        }
    }
}

/// Returns `true` if the file starts with the `%PDF-` signature.
pub fn has_pdf_signature(path: &Path) -> Result<bool> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; 5];
    match file.read_exact(&mut buffer) {
        Ok(()) => Ok(&buffer == b"%PDF-"),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}
