pub const BASE_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS override_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    opportunity_id TEXT NOT NULL,
    from_site TEXT NOT NULL,
    to_site TEXT NOT NULL,
    risk_score INTEGER NOT NULL,
    required_approval INTEGER NOT NULL,
    justification TEXT NOT NULL,
    impact_json TEXT NOT NULL,
    confirmed_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_override_opportunity_confirmed
    ON override_history(opportunity_id, confirmed_at DESC);
"#;
