use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::warn;
use std::sync::Arc;

use super::audit_model::{AuditEntry, AuditEntryDB};
use super::audit_traits::AuditSink;
use crate::db::get_connection;
use crate::errors::Result;
use crate::schema::audit_logs;

/// SQLite-backed audit sink
pub struct AuditRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl AuditRepository {
    /// Creates a new AuditRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn insert(&self, actor: &str, action: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        let db = AuditEntryDB {
            id: uuid::Uuid::new_v4().to_string(),
            actor: actor.to_string(),
            action: action.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        diesel::insert_into(audit_logs::table)
            .values(&db)
            .execute(&mut conn)?;
        Ok(())
    }

    /// Most recent audit entries
    pub fn list(&self, limit: i64) -> Result<Vec<AuditEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = audit_logs::table
            .order(audit_logs::created_at.desc())
            .limit(limit)
            .load::<AuditEntryDB>(&mut conn)?;
        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }
}

impl AuditSink for AuditRepository {
    fn log(&self, actor: &str, action: &str) {
        // An audit write failure must never roll back a financial mutation.
        if let Err(e) = self.insert(actor, action) {
            warn!("Audit write failed for actor {}: {}", actor, e);
        }
    }
}
