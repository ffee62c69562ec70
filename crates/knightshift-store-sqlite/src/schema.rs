//! SQL schema for the KnightShift SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Content columns come from the PGN headers; the trailing block is owned by
-- the validator and the enricher.
CREATE TABLE IF NOT EXISTS games (
    game_id          TEXT PRIMARY KEY,
    event            TEXT NOT NULL DEFAULT '',
    site             TEXT NOT NULL DEFAULT '',
    played_on        TEXT,            -- YYYY-MM-DD
    white            TEXT NOT NULL DEFAULT '',
    black            TEXT NOT NULL DEFAULT '',
    result           TEXT NOT NULL DEFAULT '',
    utc_date         TEXT,            -- YYYY-MM-DD
    utc_time         TEXT,            -- HH:MM:SS
    white_elo        INTEGER,
    black_elo        INTEGER,
    white_title      TEXT,
    black_title      TEXT,
    variant          TEXT NOT NULL DEFAULT '',
    time_control     TEXT NOT NULL DEFAULT '',
    eco              TEXT,
    opening          TEXT,
    termination      TEXT NOT NULL DEFAULT '',
    moves            TEXT NOT NULL DEFAULT '',
    ingested_at      TEXT NOT NULL,   -- RFC 3339 UTC
    validated        INTEGER NOT NULL DEFAULT 0,
    validated_at     TEXT,
    validation_notes TEXT,
    profile_updated  INTEGER NOT NULL DEFAULT 0,
    -- As-ingested copies of the columns the validator rewrites.
    ingested_white_elo   INTEGER,
    ingested_black_elo   INTEGER,
    ingested_white_title TEXT,
    ingested_black_title TEXT,
    ingested_eco         TEXT,
    ingested_termination TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS games_validated_idx ON games(validated);
CREATE INDEX IF NOT EXISTS games_profile_idx   ON games(profile_updated);
CREATE INDEX IF NOT EXISTS games_white_idx     ON games(white);
CREATE INDEX IF NOT EXISTS games_black_idx     ON games(black);

-- Written once per player; never updated.
CREATE TABLE IF NOT EXISTS profiles (
    user_id               TEXT PRIMARY KEY COLLATE NOCASE,
    username              TEXT,
    title                 TEXT,
    url                   TEXT,
    real_name             TEXT,
    location              TEXT,
    bio                   TEXT,
    country               TEXT,
    rating_fide           INTEGER,
    rating_uscf           INTEGER,
    rating_bullet         INTEGER,
    rating_blitz          INTEGER,
    rating_rapid          INTEGER,
    rating_classical      INTEGER,
    rating_correspondence INTEGER,
    rating_chess960       INTEGER,
    rating_ultra_bullet   INTEGER,
    created_at_ms         INTEGER,
    seen_at_ms            INTEGER,
    playtime_total        INTEGER,
    playtime_tv           INTEGER,
    games_all             INTEGER,
    games_rated           INTEGER,
    games_win             INTEGER,
    games_loss            INTEGER,
    games_draw            INTEGER,
    patron                INTEGER NOT NULL DEFAULT 0,
    streaming             INTEGER NOT NULL DEFAULT 0,
    fetched_at            TEXT NOT NULL
);

PRAGMA user_version = 1;
";
