use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tokio::runtime::Runtime;

use crate::index::{Index, IndexOptions, Record};
use crate::remote::{self, FetchError, GazetteSource};
use crate::viewer::{RequestToken, ViewerAction};

/// Completions delivered back to the terminal thread.
#[derive(Debug)]
pub enum WorkerEvent {
    IndexLoaded(Result<Index, FetchError>),
    Viewer(ViewerAction),
}

/// Runs network work on its own runtime and reports over a channel.
pub struct FetchWorker {
    runtime: Runtime,
    source: Arc<dyn GazetteSource>,
    index_options: IndexOptions,
    demo_document: Option<PathBuf>,
    events: Sender<WorkerEvent>,
}

impl FetchWorker {
    pub fn new(
        source: Arc<dyn GazetteSource>,
        index_options: IndexOptions,
        demo_document: Option<PathBuf>,
    ) -> Result<(Self, Receiver<WorkerEvent>)> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("ratchaview-fetch")
            .enable_all()
            .build()
            .context("starting fetch runtime")?;
        let (events, receiver) = unbounded();
        let worker = Self {
            runtime,
            source,
            index_options,
            demo_document,
            events,
        };
        Ok((worker, receiver))
    }

    pub fn load_index(&self) {
        let source = Arc::clone(&self.source);
        let options = self.index_options.clone();
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let result = remote::load_index(source.as_ref(), &options).await;
            if let Err(err) = &result {
                tracing::error!(%err, "index load failed");
            }
            send(&events, WorkerEvent::IndexLoaded(result));
        });
    }

    /// Fetches the document and, for drafts, the companion note concurrently.
    pub fn fetch_document(&self, token: RequestToken, record: Record) {
        if record.draft {
            let source = Arc::clone(&self.source);
            let events = self.events.clone();
            let record = record.clone();
            self.runtime.spawn(async move {
                let action = match remote::fetch_draft_note(source.as_ref(), &record).await {
                    Ok(markdown) => ViewerAction::DraftLoaded { token, markdown },
                    Err(error) => ViewerAction::DraftFailed { token, error },
                };
                send(&events, WorkerEvent::Viewer(action));
            });
        }

        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        let demo = self.demo_document.clone();
        self.runtime.spawn(async move {
            let result =
                remote::fetch_document_payload(source.as_ref(), &record, demo.as_ref()).await;
            let action = match result {
                Ok(payload) => {
                    tracing::info!(
                        token,
                        id = %record.id,
                        bytes = payload.byte_len,
                        pages = payload.page_count,
                        "document loaded"
                    );
                    ViewerAction::DocumentLoaded { token, payload }
                }
                Err(error) => ViewerAction::DocumentFailed { token, error },
            };
            send(&events, WorkerEvent::Viewer(action));
        });
    }
}

fn send(events: &Sender<WorkerEvent>, event: WorkerEvent) {
    if events.send(event).is_err() {
        tracing::debug!("worker event dropped; receiver closed");
    }
}
