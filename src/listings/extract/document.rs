use lopdf::Document;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("could not read PDF {}: {source}", path.display())]
    UnreadableDocument {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
}

/// Concatenated text layer of every page, one text line per line.
///
/// Pages whose content stream cannot be decoded are skipped with a warning; only a
/// document that cannot be opened at all is an error.
pub fn load_document_text(path: &Path) -> Result<String, ExtractError> {
    let document = Document::load(path).map_err(|source| ExtractError::UnreadableDocument {
        path: path.to_path_buf(),
        source,
    })?;

    let pages = document.get_pages();
    let mut text = String::new();
    let mut skipped = 0usize;

    for page_number in pages.keys().copied() {
        match document.extract_text(&[page_number]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                if !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Err(err) => {
                skipped += 1;
                warn!(page = page_number, error = %err, "skipping page without readable text");
            }
        }
    }

    info!(
        path = %path.display(),
        pages = pages.len(),
        skipped,
        "loaded document text"
    );

    Ok(text)
}
