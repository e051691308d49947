//! Content-addressed completion cache
//!
//! One SQLite file per model under `<save_dir>/llm_cache/`, schema
//! `cache(key TEXT PRIMARY KEY, message TEXT, metadata TEXT)`. The key is the
//! SHA-256 of the canonical JSON of `(model, seed, temperature, messages)`,
//! so identical deterministic calls hit the same row across restarts.
//!
//! Writes are serialized through a single pooled connection; reads open
//! short-lived connections and take no lock (last-writer-wins is fine for
//! idempotent responses).

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::backend::CompletionMeta;
use crate::message::ChatMessage;
use crate::GatewayError;

#[derive(Serialize)]
struct CacheKeyPayload<'a> {
    model: &'a str,
    seed: i64,
    temperature: f32,
    messages: &'a [ChatMessage],
}

/// Compute the cache key for a completion call.
pub fn cache_key(model: &str, seed: i64, temperature: f32, messages: &[ChatMessage]) -> String {
    let payload = CacheKeyPayload {
        model,
        seed,
        temperature,
        messages,
    };
    let json = serde_json::to_string(&payload).expect("cache key serialization cannot fail");
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// On-disk completion cache for one model.
pub struct ResponseCache {
    path: PathBuf,
    writer: Mutex<Connection>,
}

impl ResponseCache {
    /// Open (or create) the cache file for `model` under `cache_dir`.
    pub fn open(cache_dir: &Path, model: &str) -> Result<Self, GatewayError> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| GatewayError::Permanent(format!("cache dir: {}", e)))?;
        let file = format!("{}.sqlite", model.replace('/', "_"));
        let path = cache_dir.join(file);

        let writer = Connection::open(&path)
            .map_err(|e| GatewayError::Permanent(format!("cache open: {}", e)))?;
        writer
            .pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| GatewayError::Permanent(format!("cache pragma: {}", e)))?;
        writer
            .execute(
                "CREATE TABLE IF NOT EXISTS cache (
                    key TEXT PRIMARY KEY,
                    message TEXT,
                    metadata TEXT
                )",
                [],
            )
            .map_err(|e| GatewayError::Permanent(format!("cache schema: {}", e)))?;

        Ok(Self {
            path,
            writer: Mutex::new(writer),
        })
    }

    /// Look up a cached completion. Opens its own read connection; never
    /// blocks on the writer.
    pub fn get(&self, key: &str) -> Option<(String, CompletionMeta)> {
        let conn = Connection::open(&self.path).ok()?;
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT message, metadata FROM cache WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .ok()?;

        row.map(|(message, metadata_json)| {
            let mut meta: CompletionMeta =
                serde_json::from_str(&metadata_json).unwrap_or_default();
            meta.cached = true;
            (message, meta)
        })
    }

    /// Store a completion. Errors are logged and swallowed: a failed cache
    /// write must never fail the request.
    pub fn put(&self, key: &str, message: &str, meta: &CompletionMeta) {
        let metadata_json = match serde_json::to_string(meta) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("cache metadata serialization failed: {}", e);
                return;
            }
        };
        let conn = self.writer.lock();
        if let Err(e) = conn.execute(
            "INSERT OR REPLACE INTO cache (key, message, metadata) VALUES (?1, ?2, ?3)",
            [key, message, metadata_json.as_str()],
        ) {
            tracing::warn!("cache write failed: {}", e);
        }
    }

    /// Number of cached rows (diagnostics).
    pub fn len(&self) -> usize {
        let conn = self.writer.lock();
        conn.query_row("SELECT COUNT(*) FROM cache", [], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
