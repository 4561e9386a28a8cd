//! Processed-file contract for attachments.
//!
//! The stores and the gateway never see raw file bytes; they only ever see
//! a [`ProcessedFile`] whose `content` is human-readable text. Whoever
//! extracts that text (a UI layer) can use the builders here for the
//! common degradations: a truncated excerpt, an unreadable-binary
//! placeholder, or an extraction failure.

use serde::{Deserialize, Serialize};

/// Character budget for inlined text excerpts
pub const TEXT_EXCERPT_BUDGET: usize = 10_000;

/// A file reduced to text the model can read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedFile {
    pub name: String,
    pub media_type: String,
    pub size: u64,
    /// Always human-readable: an excerpt, a truncated body with a notice,
    /// or a placeholder naming why the content is not inlined
    pub content: String,
    pub error: Option<String>,
}

impl ProcessedFile {
    /// Inline a text body, truncating past the character budget with an
    /// explicit notice
    pub fn text_excerpt(
        name: impl Into<String>,
        media_type: impl Into<String>,
        size: u64,
        body: &str,
    ) -> Self {
        let name = name.into();
        let content = if body.chars().count() > TEXT_EXCERPT_BUDGET {
            let excerpt: String = body.chars().take(TEXT_EXCERPT_BUDGET).collect();
            format!(
                "[Text File: {name}]\n\n{excerpt}\n\n[Note: This file was truncated as it's \
                 very large. Only the first {TEXT_EXCERPT_BUDGET} characters are shown.]"
            )
        } else {
            format!("[Text File: {name}]\n\n{body}")
        };
        Self {
            name,
            media_type: media_type.into(),
            size,
            content,
            error: None,
        }
    }

    /// Placeholder for a file whose content cannot be read directly
    pub fn placeholder(name: impl Into<String>, media_type: impl Into<String>, size: u64) -> Self {
        let name = name.into();
        let media_type = media_type.into();
        let shown_type = if media_type.is_empty() {
            "Unknown"
        } else {
            media_type.as_str()
        };
        let content = format!(
            "[File: {name}]\nType: {shown_type}\nSize: {:.1}KB\n\nThis file has been attached \
             but its content cannot be read directly. Please describe what you'd like me to \
             help you with regarding this file.",
            size as f64 / 1024.0
        );
        Self {
            name,
            media_type,
            size,
            content,
            error: None,
        }
    }

    /// Record an extraction failure while keeping the message sendable
    pub fn failed(
        name: impl Into<String>,
        media_type: impl Into<String>,
        size: u64,
        error: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            content: format!("[Error processing file: {name}]"),
            name,
            media_type: media_type.into(),
            size,
            error: Some(error.into()),
        }
    }
}

/// Render the user's text followed by each attachment's derived content
pub fn fold_into_prompt(text: &str, files: &[ProcessedFile]) -> String {
    let mut prompt = text.to_string();
    for file in files {
        prompt.push_str("\n\n");
        prompt.push_str(&file.content);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_inlined_whole() {
        let file = ProcessedFile::text_excerpt("notes.md", "text/markdown", 12, "hello world");
        assert_eq!(file.content, "[Text File: notes.md]\n\nhello world");
        assert!(file.error.is_none());
    }

    #[test]
    fn oversized_text_is_truncated_with_notice() {
        let body = "x".repeat(TEXT_EXCERPT_BUDGET + 1);
        let file = ProcessedFile::text_excerpt("big.txt", "text/plain", 0, &body);
        assert!(file.content.contains("[Note: This file was truncated"));
        assert!(!file.content.contains(&"x".repeat(TEXT_EXCERPT_BUDGET + 1)));
    }

    #[test]
    fn placeholder_names_the_unknown_type() {
        let file = ProcessedFile::placeholder("photo.raw", "", 2048);
        assert!(file.content.contains("Type: Unknown"));
        assert!(file.content.contains("Size: 2.0KB"));
    }

    #[test]
    fn fold_appends_each_attachment_after_the_text() {
        let files = [
            ProcessedFile::text_excerpt("a.txt", "text/plain", 1, "A"),
            ProcessedFile::placeholder("b.bin", "application/octet-stream", 10),
        ];
        let prompt = fold_into_prompt("look at these", &files);
        assert!(prompt.starts_with("look at these\n\n[Text File: a.txt]"));
        assert!(prompt.contains("[File: b.bin]"));
    }

    #[test]
    fn fold_without_files_is_just_the_text() {
        assert_eq!(fold_into_prompt("plain", &[]), "plain");
    }
}
