//! V002 migration: versioned pattern batches.
//!
//! `patterns` is keyed by (kind, signature, window_days) so rediscovery
//! refreshes the existing row. `pattern_scores` rows belong to one pattern and
//! are replaced together with it.

pub const MIGRATION_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS patterns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    signature TEXT NOT NULL,
    window_days INTEGER NOT NULL,
    params TEXT NOT NULL DEFAULT '{}',
    strength REAL NOT NULL,
    support INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'active',
    batch_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    UNIQUE (kind, signature, window_days)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_patterns_window_status ON patterns(window_days, status);
CREATE INDEX IF NOT EXISTS idx_patterns_batch ON patterns(batch_id);
CREATE INDEX IF NOT EXISTS idx_patterns_updated ON patterns(updated_at);

CREATE TABLE IF NOT EXISTS pattern_scores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pattern_id INTEGER NOT NULL REFERENCES patterns(id) ON DELETE CASCADE,
    number INTEGER NOT NULL CHECK (number BETWEEN 0 AND 99),
    score REAL NOT NULL,
    confidence REAL NOT NULL,
    period_start TEXT NOT NULL,
    period_end TEXT NOT NULL,
    details TEXT NOT NULL DEFAULT '{}',
    reasoning TEXT NOT NULL DEFAULT '',
    batch_id TEXT NOT NULL,
    UNIQUE (pattern_id, number, period_start, period_end)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_pattern_scores_pattern ON pattern_scores(pattern_id);
CREATE INDEX IF NOT EXISTS idx_pattern_scores_number ON pattern_scores(number);
"#;
