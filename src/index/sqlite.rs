//! SQLite-backed index persistence.
//!
//! The store holds at most one index: a single metadata row plus its chunks.
//! Saving replaces both inside one transaction so a crash never leaves a
//! half-written index behind.

use super::{IndexSource, IndexStore, IndexedChunk, VectorIndex};
use crate::error::{PrimerError, Result};
use crate::source::SourceKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS index_meta (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        source_kind TEXT NOT NULL,
        source_label TEXT NOT NULL,
        embedding_model TEXT NOT NULL,
        dimensions INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        chunk_order INTEGER NOT NULL,
        page INTEGER,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_order ON chunks(chunk_order);
"#;

/// SQLite index store.
pub struct SqliteIndexStore {
    conn: Mutex<Connection>,
}

impl SqliteIndexStore {
    /// Open (or create) the store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened index store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PrimerError::Index(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    #[instrument(skip(self, index), fields(chunks = index.len()))]
    async fn save(&self, index: &VectorIndex) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM chunks", [])?;
        tx.execute("DELETE FROM index_meta", [])?;

        let source = index.source();
        tx.execute(
            r#"
            INSERT INTO index_meta
            (id, source_kind, source_label, embedding_model, dimensions, created_at)
            VALUES (1, ?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                source.kind.to_string(),
                source.label,
                index.embedding_model(),
                index.dimensions() as i64,
                source.created_at.to_rfc3339(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO chunks (id, chunk_order, page, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for chunk in index.chunks() {
                stmt.execute(params![
                    chunk.id.to_string(),
                    chunk.order,
                    chunk.page,
                    chunk.content,
                    Self::embedding_to_bytes(&chunk.embedding),
                ])?;
            }
        }

        tx.commit()?;
        debug!("Saved index for {} {}", source.kind, source.label);
        Ok(())
    }

    async fn load(&self) -> Result<Option<VectorIndex>> {
        let conn = self.lock()?;

        let meta = conn
            .query_row(
                r#"
                SELECT source_kind, source_label, embedding_model, created_at
                FROM index_meta WHERE id = 1
                "#,
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((kind, label, embedding_model, created_at)) = meta else {
            return Ok(None);
        };

        let kind: SourceKind = kind.parse().map_err(PrimerError::Index)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PrimerError::Index(format!("Invalid timestamp in store: {}", e)))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, chunk_order, page, content, embedding
            FROM chunks ORDER BY chunk_order
            "#,
        )?;

        let chunks = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let embedding: Vec<u8> = row.get(4)?;
                Ok(IndexedChunk {
                    id: Uuid::parse_str(&id).unwrap_or_else(|_| Uuid::new_v4()),
                    order: row.get(1)?,
                    page: row.get(2)?,
                    content: row.get(3)?,
                    embedding: Self::bytes_to_embedding(&embedding),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let source = IndexSource {
            kind,
            label,
            created_at,
        };

        VectorIndex::from_parts(source, embedding_model, chunks).map(Some)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch("DELETE FROM chunks; DELETE FROM index_meta;")?;
        Ok(())
    }
}
