//! SQL schema for the ShadowHunter SQLite store.
//!
//! Executed at connection startup and again by every explicit
//! `initialize()` call. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `target_id` columns deliberately carry no REFERENCES clause: the link to
/// `targets` is advisory and orphan findings are accepted.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS targets (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at  TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    family_name TEXT,
    given_name  TEXT,
    handle      TEXT,
    email       TEXT,
    phone       TEXT,
    location    TEXT,
    aliases     TEXT             -- comma-and-space-joined
);

-- Findings are strictly append-only.
-- No UPDATE or DELETE is ever issued against these tables.
CREATE TABLE IF NOT EXISTS email_breaches (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    target_id     INTEGER,
    email         TEXT NOT NULL,
    breach_name   TEXT,
    breach_title  TEXT,
    breach_date   TEXT,
    breach_domain TEXT,
    raw_json      TEXT,           -- provider object, verbatim
    found_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS source_results (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    target_id INTEGER,
    source    TEXT NOT NULL,
    type      TEXT NOT NULL,
    url       TEXT,
    score     REAL NOT NULL DEFAULT 0,
    summary   TEXT,
    raw_json  TEXT,
    found_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS phone_lookups (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    target_id   INTEGER,
    number      TEXT NOT NULL,
    e164        TEXT,
    country     TEXT,
    carrier     TEXT,
    is_valid    INTEGER,          -- 0 | 1 | NULL
    is_possible INTEGER,          -- 0 | 1 | NULL
    raw_json    TEXT,
    found_at    TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS email_breaches_target_idx ON email_breaches(target_id);
CREATE INDEX IF NOT EXISTS source_results_target_idx ON source_results(target_id);
CREATE INDEX IF NOT EXISTS phone_lookups_target_idx  ON phone_lookups(target_id);

PRAGMA user_version = 1;
";
