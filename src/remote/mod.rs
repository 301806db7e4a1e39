//! Remote data: the gazette index, the draft listing, documents and draft notes.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::document::DocumentPayload;
use crate::index::{build_index, parse_records, DraftSet, Index, IndexOptions, Record};

mod error;
mod http;

pub use error::FetchError;
pub use http::HttpGazetteSource;

/// Everything the viewer reads from the network.
#[async_trait]
pub trait GazetteSource: Send + Sync {
    async fn fetch_index_csv(&self) -> Result<String, FetchError>;

    /// Stems of the markdown notes under the drafts folder.
    async fn fetch_draft_set(&self) -> Result<DraftSet, FetchError>;

    async fn fetch_document(&self, file_name: &str) -> Result<Vec<u8>, FetchError>;

    async fn fetch_draft_markdown(&self, markdown_name: &str) -> Result<String, FetchError>;
}

/// Fetches the CSV and the draft listing concurrently, then builds the index.
///
/// A failed draft listing only disables draft flagging; CSV fetch or parse
/// failures are returned.
pub async fn load_index(
    source: &dyn GazetteSource,
    options: &IndexOptions,
) -> Result<Index, FetchError> {
    let (csv, drafts) = tokio::join!(source.fetch_index_csv(), source.fetch_draft_set());
    let drafts = match drafts {
        Ok(drafts) => drafts,
        Err(err) => {
            tracing::warn!(%err, "draft listing unavailable; continuing without drafts");
            DraftSet::new()
        }
    };
    let raw = csv?;
    let rows = parse_records(&raw)?;
    let index = build_index(rows, &drafts, options);
    tracing::info!(
        entries = index.len(),
        drafts = index.draft_count(),
        "gazette index loaded"
    );
    Ok(index)
}

/// Raw document bytes for a record. The placeholder record reads
/// `demo_document` from disk when one is configured.
pub async fn fetch_document_bytes(
    source: &dyn GazetteSource,
    record: &Record,
    demo_document: Option<&PathBuf>,
) -> Result<Vec<u8>, FetchError> {
    match demo_document {
        Some(path) if record.is_placeholder() => {
            tracing::debug!(path = %path.display(), "serving placeholder from disk");
            read_local(path.clone()).await
        }
        _ => source.fetch_document(record.file_name()).await,
    }
}

/// Fetches the record's document and encodes it off the async workers.
pub async fn fetch_document_payload(
    source: &dyn GazetteSource,
    record: &Record,
    demo_document: Option<&PathBuf>,
) -> Result<DocumentPayload, FetchError> {
    let bytes = fetch_document_bytes(source, record, demo_document).await?;
    tokio::task::spawn_blocking(move || DocumentPayload::from_bytes(&bytes))
        .await
        .map_err(|err| FetchError::Network(format!("encoding task failed: {err}")))
}

pub async fn fetch_draft_note(
    source: &dyn GazetteSource,
    record: &Record,
) -> Result<String, FetchError> {
    source.fetch_draft_markdown(&record.markdown_name()).await
}

async fn read_local(path: PathBuf) -> Result<Vec<u8>, FetchError> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || std::fs::read(&path))
        .await
        .map_err(|err| FetchError::Network(format!("reading {display}: {err}")))?
        .map_err(|err| FetchError::Network(format!("reading {display}: {err}")))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory source with canned responses and a document call counter.
    #[derive(Default)]
    pub struct FakeSource {
        pub csv: Option<Result<String, FetchError>>,
        pub drafts: Option<Result<DraftSet, FetchError>>,
        pub documents: HashMap<String, Result<Vec<u8>, FetchError>>,
        pub notes: HashMap<String, Result<String, FetchError>>,
        pub document_calls: AtomicUsize,
    }

    impl FakeSource {
        pub fn document_calls(&self) -> usize {
            self.document_calls.load(Ordering::SeqCst)
        }
    }

    fn missing() -> FetchError {
        FetchError::Http {
            status: 404,
            body: "not found".into(),
        }
    }

    #[async_trait]
    impl GazetteSource for FakeSource {
        async fn fetch_index_csv(&self) -> Result<String, FetchError> {
            self.csv.clone().unwrap_or_else(|| Err(missing()))
        }

        async fn fetch_draft_set(&self) -> Result<DraftSet, FetchError> {
            self.drafts.clone().unwrap_or_else(|| Ok(DraftSet::new()))
        }

        async fn fetch_document(&self, file_name: &str) -> Result<Vec<u8>, FetchError> {
            self.document_calls.fetch_add(1, Ordering::SeqCst);
            self.documents
                .get(file_name)
                .cloned()
                .unwrap_or_else(|| Err(missing()))
        }

        async fn fetch_draft_markdown(&self, markdown_name: &str) -> Result<String, FetchError> {
            self.notes
                .get(markdown_name)
                .cloned()
                .unwrap_or_else(|| Err(missing()))
        }
    }
}
