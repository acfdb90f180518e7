use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// One admin/operator audit row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub created_at: NaiveDateTime,
}

/// Database model for audit rows
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::audit_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditEntryDB {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub created_at: NaiveDateTime,
}

impl From<AuditEntryDB> for AuditEntry {
    fn from(db: AuditEntryDB) -> Self {
        AuditEntry {
            id: db.id,
            actor: db.actor,
            action: db.action,
            created_at: db.created_at,
        }
    }
}
