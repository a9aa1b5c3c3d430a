use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::audit::migrations::BASE_MIGRATION;
use crate::audit::OverrideRecord;

/// SQLite-backed audit trail of confirmed overrides.
pub struct AuditStore {
    conn: Connection,
}

impl AuditStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(BASE_MIGRATION)?;
        Ok(())
    }

    pub fn insert_override(&self, record: &OverrideRecord) -> Result<()> {
        self.conn.execute(
            r#"
INSERT INTO override_history(
    opportunity_id, from_site, to_site, risk_score, required_approval,
    justification, impact_json, confirmed_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
"#,
            params![
                record.opportunity_id,
                record.from_site,
                record.to_site,
                i64::from(record.risk_score),
                if record.required_approval { 1 } else { 0 },
                record.justification,
                record.impact_json,
                record.confirmed_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn load_history(
        &self,
        opportunity: Option<&str>,
        limit: usize,
    ) -> Result<Vec<OverrideRecord>> {
        let sql = if opportunity.is_some() {
            r#"
SELECT opportunity_id, from_site, to_site, risk_score, required_approval,
       justification, impact_json, confirmed_at
FROM override_history
WHERE opportunity_id = ?1
ORDER BY id DESC
LIMIT ?2
"#
        } else {
            r#"
SELECT opportunity_id, from_site, to_site, risk_score, required_approval,
       justification, impact_json, confirmed_at
FROM override_history
ORDER BY id DESC
LIMIT ?1
"#
        };

        let mut stmt = self.conn.prepare(sql)?;
        let rows = if let Some(opportunity) = opportunity {
            stmt.query_map(params![opportunity, limit as i64], row_to_override_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit as i64], row_to_override_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }
}

fn row_to_override_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<OverrideRecord> {
    let confirmed_at_raw: String = row.get(7)?;
    let confirmed_at = DateTime::parse_from_rfc3339(&confirmed_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    Ok(OverrideRecord {
        opportunity_id: row.get(0)?,
        from_site: row.get(1)?,
        to_site: row.get(2)?,
        risk_score: row.get::<_, i64>(3)? as u8,
        required_approval: row.get::<_, i64>(4)? != 0,
        justification: row.get(5)?,
        impact_json: row.get(6)?,
        confirmed_at,
    })
}
