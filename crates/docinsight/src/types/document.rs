//! Raw document and chunk types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// File types the extractor dispatches on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Microsoft Word document (.docx)
    Docx,
    /// Anything else; decoded as text on a best-effort basis
    Other,
}

impl FileType {
    /// Detect file type from a filename suffix (case-insensitive)
    pub fn from_filename(filename: &str) -> Self {
        let lower = filename.to_lowercase();
        match lower.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Other,
        }
    }

    /// Detect file type from an extension without the leading dot
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" => Self::Txt,
            "docx" => Self::Docx,
            _ => Self::Other,
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "Text File",
            Self::Docx => "Word Document (.docx)",
            Self::Other => "Unknown (decoded as text)",
        }
    }
}

/// Uploaded bytes plus the filename hint used for dispatch
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Original filename
    pub filename: String,
    /// File content
    pub data: Bytes,
}

impl RawDocument {
    /// Create a new raw document
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Detected file type
    pub fn file_type(&self) -> FileType {
        FileType::from_filename(&self.filename)
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when there are no bytes
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// SHA-256 of the content, hex encoded
    pub fn content_hash(&self) -> String {
        hash_bytes(&self.data)
    }
}

/// Hash bytes for deduplication and integrity checks
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// A bounded window over extracted text
///
/// `char_start..char_end` is the window's span in the source text, measured
/// in chars. Consecutive chunks overlap: the next chunk starts before the
/// previous one ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in the splitting sequence
    pub index: usize,
    /// Chunk text, exactly `source[char_start..char_end]`
    pub content: String,
    /// Start offset in the source text (chars, inclusive)
    pub char_start: usize,
    /// End offset in the source text (chars, exclusive)
    pub char_end: usize,
}

impl Chunk {
    /// Length in chars
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }

    /// The part of this chunk not already covered by text ending at `prev_end`
    pub fn novel_part(&self, prev_end: usize) -> &str {
        let skip = prev_end.saturating_sub(self.char_start);
        match self.content.char_indices().nth(skip) {
            Some((byte, _)) => &self.content[byte..],
            None => "",
        }
    }
}

/// Rebuild the source text from an ordered chunk sequence
pub fn reconstruct(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    let mut covered = 0usize;

    for chunk in chunks {
        text.push_str(chunk.novel_part(covered));
        covered = covered.max(chunk.char_end);
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_dispatch_is_case_insensitive() {
        assert_eq!(FileType::from_filename("Report.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.Txt"), FileType::Txt);
        assert_eq!(FileType::from_filename("memo.DocX"), FileType::Docx);
        assert_eq!(FileType::from_filename("archive.tar.gz"), FileType::Other);
        assert_eq!(FileType::from_filename("README"), FileType::Other);
    }

    #[test]
    fn test_novel_part_skips_overlap() {
        let chunk = Chunk {
            index: 1,
            content: "héllo world".to_string(),
            char_start: 10,
            char_end: 21,
        };
        assert_eq!(chunk.novel_part(10), "héllo world");
        assert_eq!(chunk.novel_part(13), "lo world");
        assert_eq!(chunk.novel_part(21), "");
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = RawDocument::new("a.txt", b"same".to_vec());
        let b = RawDocument::new("b.txt", b"same".to_vec());
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }
}
