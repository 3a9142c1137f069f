//! SQLCipher-backed diary design attachment repository.
//!
//! Implements the `DiaryDesignStore` port: the update call that writes a
//! generated design reference onto a diary. The diary record itself is owned
//! by the trip CRUD collaborator; this table holds only the attachment.

use std::sync::Arc;

use async_trait::async_trait;
use roamly_core::design_export::ports::DiaryDesignStore;
use roamly_domain::{DesignResult, Result};
use rusqlite::{params, OptionalExtension};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};

/// SQLCipher-backed store for diary design attachments.
pub struct SqliteDiaryDesignRepository {
    db: Arc<DbManager>,
}

impl SqliteDiaryDesignRepository {
    /// Create a new repository with the given database manager.
    #[must_use]
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Fetch the design attached to a diary, if any.
    ///
    /// # Errors
    /// Returns [`roamly_domain::ExportError::Storage`] on SQL failure.
    pub async fn get_design(&self, diary_id: &str) -> Result<Option<DesignResult>> {
        let db = Arc::clone(&self.db);
        let diary_id = diary_id.to_string();

        task::spawn_blocking(move || -> Result<Option<DesignResult>> {
            let conn = db.get_connection()?;
            conn.query_row(
                "SELECT design_id, design_url, editor_url
                 FROM diary_designs WHERE diary_id = ?1",
                params![diary_id],
                |row| {
                    Ok(DesignResult {
                        design_id: row.get(0)?,
                        design_url: row.get(1)?,
                        editor_url: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl DiaryDesignStore for SqliteDiaryDesignRepository {
    async fn attach_design(&self, diary_id: &str, design: &DesignResult) -> Result<()> {
        let db = Arc::clone(&self.db);
        let diary_id = diary_id.to_string();
        let design = design.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO diary_designs
                    (diary_id, design_id, design_url, editor_url, updated_at)
                 VALUES (?1, ?2, ?3, ?4, CAST(strftime('%s','now') AS INTEGER))
                 ON CONFLICT(diary_id) DO UPDATE SET
                    design_id = excluded.design_id,
                    design_url = excluded.design_url,
                    editor_url = excluded.editor_url,
                    updated_at = excluded.updated_at",
                params![diary_id, design.design_id, design.design_url, design.editor_url],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}
