// Multipart file uploads with byte-level progress.
//
// The file body is streamed in fixed-size chunks; every chunk handed to
// the transport reports `(sent, total)` to the caller's callback.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::error::Error;

const CHUNK_SIZE: usize = 64 * 1024;

/// Progress callback: `(bytes_sent, bytes_total)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// A binary file to send as the `file` part of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub content: Bytes,
}

impl UploadFile {
    /// Wrap in-memory content; the MIME type is guessed from the extension.
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .to_string();
        Self {
            file_name,
            mime,
            content: content.into(),
        }
    }

    /// Read a file from disk.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, content))
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    pub fn len(&self) -> u64 {
        u64::try_from(self.content.len()).unwrap_or(u64::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Build the multipart form: the file part plus plain text fields.
    pub(crate) fn into_form(
        self,
        fields: &[(String, String)],
        progress: Option<ProgressFn>,
    ) -> Result<Form, Error> {
        let total = self.len();
        let body = progress_body(self.content, progress);
        let part = Part::stream_with_length(body, total)
            .file_name(self.file_name)
            .mime_str(&self.mime)?;

        let form = fields
            .iter()
            .fold(Form::new().part("file", part), |form, (key, value)| {
                form.text(key.clone(), value.clone())
            });
        Ok(form)
    }
}

fn progress_body(content: Bytes, progress: Option<ProgressFn>) -> reqwest::Body {
    let total = u64::try_from(content.len()).unwrap_or(u64::MAX);
    let chunks: Vec<Bytes> = (0..content.len())
        .step_by(CHUNK_SIZE)
        .map(|start| content.slice(start..content.len().min(start + CHUNK_SIZE)))
        .collect();

    let mut sent = 0u64;
    let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += u64::try_from(chunk.len()).unwrap_or(0);
        if let Some(report) = progress.as_ref() {
            report(sent, total);
        }
        Ok::<_, std::io::Error>(chunk)
    }));

    reqwest::Body::wrap_stream(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(UploadFile::new("shops.CSV", Vec::new()).mime, "text/csv");
        assert_eq!(
            UploadFile::new("shops.xlsx", Vec::new()).mime,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(
            UploadFile::new("regions.tsv", Vec::new()).mime,
            "text/tab-separated-values"
        );
        assert_eq!(
            UploadFile::new("blob", Vec::new()).mime,
            "application/octet-stream"
        );
    }

    #[test]
    fn mime_override() {
        let file = UploadFile::new("x.bin", vec![1, 2, 3]).with_mime("text/plain");
        assert_eq!(file.mime, "text/plain");
        assert_eq!(file.len(), 3);
        assert!(!file.is_empty());
    }
}
