use std::path::Path;

/// Extensions read as plain text study material
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "csv"];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(
        "Unsupported file type '{extension}'. Only .txt, .md and .csv files can be read; please paste the text of PDF or DOCX files manually for best results."
    )]
    UnsupportedFormat { extension: String },

    #[error("File is not valid UTF-8 text: {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

pub fn is_supported_file(path: impl AsRef<Path>) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension_of(path.as_ref()).as_str())
}

/// Read a local file into the `content` string used for plan generation
pub async fn read_study_material(path: impl AsRef<Path>) -> Result<String, IngestError> {
    let path = path.as_ref();
    if !is_supported_file(path) {
        return Err(IngestError::UnsupportedFormat {
            extension: extension_of(path),
        });
    }

    let bytes = tokio::fs::read(path).await?;
    let content = String::from_utf8(bytes)?;
    tracing::debug!(
        path = %path.display(),
        content_chars = content.chars().count(),
        "Read study material"
    );
    Ok(content)
}
