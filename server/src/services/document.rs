//! Project document storage.
//!
//! DESIGN
//! ======
//! The live operation stream is never stored. What persists is the whole
//! project snapshot a client loads before joining and periodically saves
//! back. `DocumentStore` is the seam: an in-memory map when no database is
//! configured, Postgres otherwise.
//!
//! ERROR HANDLING
//! ==============
//! A missing project is `NotFound`; routes map it to 404. A stored
//! `canvas_data` that is not a JSON array surfaces as `Serialize`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use frames::ProjectDocument;
use serde_json::Value;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("project not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("malformed document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl crate::frame::ErrorCode for DocumentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_PROJECT_NOT_FOUND",
            Self::Database(_) => "E_DATABASE",
            Self::Serialize(_) => "E_DOCUMENT_MALFORMED",
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load the stored snapshot for `project_id`.
    async fn get(&self, project_id: &str) -> Result<ProjectDocument, DocumentError>;

    /// Replace the snapshot for `project_id`, creating it if absent. Returns
    /// the stored document with `last_edited` set by the store.
    async fn update(&self, project_id: &str, document: ProjectDocument) -> Result<ProjectDocument, DocumentError>;
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, ProjectDocument>>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, project_id: &str) -> Result<ProjectDocument, DocumentError> {
        self.documents
            .read()
            .await
            .get(project_id)
            .cloned()
            .ok_or_else(|| DocumentError::NotFound(project_id.to_owned()))
    }

    async fn update(&self, project_id: &str, mut document: ProjectDocument) -> Result<ProjectDocument, DocumentError> {
        document.last_edited = frames::now_ms();
        self.documents
            .write()
            .await
            .insert(project_id.to_owned(), document.clone());
        Ok(document)
    }
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "canvas_data, background_color, width, height, \
     (extract(epoch from last_edited) * 1000)::bigint AS last_edited_ms";

fn row_to_document(row: &sqlx::postgres::PgRow) -> Result<ProjectDocument, DocumentError> {
    let canvas_data: Value = row.try_get("canvas_data")?;
    Ok(ProjectDocument {
        canvas_data: serde_json::from_value(canvas_data)?,
        background_color: row.try_get("background_color")?,
        width: row.try_get("width")?,
        height: row.try_get("height")?,
        last_edited: row.try_get("last_edited_ms")?,
    })
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, project_id: &str) -> Result<ProjectDocument, DocumentError> {
        let row = sqlx::query(&format!("SELECT {SELECT_COLUMNS} FROM projects WHERE id = $1"))
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DocumentError::NotFound(project_id.to_owned()))?;
        row_to_document(&row)
    }

    async fn update(&self, project_id: &str, document: ProjectDocument) -> Result<ProjectDocument, DocumentError> {
        let canvas_data = serde_json::to_value(&document.canvas_data)?;
        let row = sqlx::query(&format!(
            "INSERT INTO projects (id, canvas_data, background_color, width, height, last_edited) \
             VALUES ($1, $2, $3, $4, $5, now()) \
             ON CONFLICT (id) DO UPDATE SET \
                 canvas_data = EXCLUDED.canvas_data, background_color = EXCLUDED.background_color, \
                 width = EXCLUDED.width, height = EXCLUDED.height, last_edited = now() \
             RETURNING {SELECT_COLUMNS}"
        ))
        .bind(project_id)
        .bind(canvas_data)
        .bind(&document.background_color)
        .bind(document.width)
        .bind(document.height)
        .fetch_one(&self.pool)
        .await?;
        row_to_document(&row)
    }
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
