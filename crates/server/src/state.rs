//! Shared application state
//!
//! One [`RetrievalEngine`] per loaded index, swapped atomically behind an
//! `RwLock` on `/index` and `/reload`. The model registry is built once and
//! shared between the engine and the index builder.

use std::sync::Arc;

use parking_lot::RwLock;

use bhorti_config::Settings;
use bhorti_core::Error;
use bhorti_index::IndexBuilder;
use bhorti_llm::ModelRegistry;
use bhorti_pipeline::{QueryPipeline, RetrievalEngine};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    settings: Settings,
    registry: Arc<ModelRegistry>,
    engine: RwLock<Option<Arc<RetrievalEngine>>>,
}

impl AppState {
    pub fn new(settings: Settings, registry: Arc<ModelRegistry>) -> Self {
        Self {
            inner: Arc::new(Inner {
                settings,
                registry,
                engine: RwLock::new(None),
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Try to load a previously built index from disk at startup. Missing
    /// artifacts are not an error — `/index` will create them.
    pub fn try_autoload(&self) {
        match RetrievalEngine::load(
            self.inner.settings.clone(),
            self.inner.registry.clone(),
        ) {
            Ok(engine) => {
                tracing::info!(
                    indexed_docs = engine.indexed_docs(),
                    "engine auto-loaded from cache"
                );
                *self.inner.engine.write() = Some(Arc::new(engine));
            }
            Err(Error::IndexNotLoaded) => {
                tracing::info!("no existing index found; call /index or /index-folder");
            }
            Err(e) => {
                tracing::warn!("engine auto-load failed: {}", e);
            }
        }
    }

    /// Reload the engine from the artifacts on disk.
    pub fn reload(&self) -> Result<usize, Error> {
        let engine = RetrievalEngine::load(
            self.inner.settings.clone(),
            self.inner.registry.clone(),
        )?;
        let docs = engine.indexed_docs();
        *self.inner.engine.write() = Some(Arc::new(engine));
        Ok(docs)
    }

    /// Build a fresh index from raw document chunks, then load it.
    pub async fn index_documents(&self, documents: Vec<String>) -> Result<usize, Error> {
        let builder = IndexBuilder::new(
            self.inner.registry.clone(),
            &self.inner.settings.paths.save_dir,
        );
        let summary = builder.build(documents).await.map_err(Error::from)?;
        self.reload()?;
        Ok(summary.indexed_docs)
    }

    /// The current pipeline, or `IndexNotLoaded` before any index exists.
    pub fn pipeline(&self) -> Result<QueryPipeline, Error> {
        let engine = self
            .inner
            .engine
            .read()
            .clone()
            .ok_or(Error::IndexNotLoaded)?;
        Ok(QueryPipeline::new(engine))
    }

    /// Indexed passage count, zero before load.
    pub fn indexed_docs(&self) -> usize {
        self.inner
            .engine
            .read()
            .as_ref()
            .map(|engine| engine.indexed_docs())
            .unwrap_or(0)
    }

    pub fn is_ready(&self) -> bool {
        self.inner.engine.read().is_some()
    }

    pub fn engine(&self) -> Option<Arc<RetrievalEngine>> {
        self.inner.engine.read().clone()
    }
}
