//! V001 migration: draw history and key/value metadata.

pub const MIGRATION_SQL: &str = r#"
-- One row per (date, number, position). Dates are ISO-8601 text.
CREATE TABLE IF NOT EXISTS draw_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    draw_date TEXT NOT NULL,
    number INTEGER NOT NULL CHECK (number BETWEEN 0 AND 99),
    position INTEGER NOT NULL CHECK (position BETWEEN 1 AND 3),
    created_at INTEGER NOT NULL DEFAULT (unixepoch()),
    UNIQUE (draw_date, number, position)
) STRICT;

CREATE INDEX IF NOT EXISTS idx_draw_results_date ON draw_results(draw_date);
CREATE INDEX IF NOT EXISTS idx_draw_results_number ON draw_results(number);

CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
) STRICT;
"#;
