//! SQL schema for the Ringbook SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL,
    phone       TEXT NOT NULL UNIQUE,   -- E.164
    email       TEXT UNIQUE,
    is_staff    INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

-- One row per canonical phone. Never deleted by the application; the user
-- link is cleared when the user goes away.
CREATE TABLE IF NOT EXISTS directory (
    phone       TEXT PRIMARY KEY,
    user_id     TEXT UNIQUE REFERENCES users(user_id) ON DELETE SET NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contacts (
    alias_id    TEXT PRIMARY KEY,
    owner_id    TEXT REFERENCES users(user_id) ON DELETE SET NULL,
    phone       TEXT NOT NULL REFERENCES directory(phone) ON DELETE CASCADE,
    name        TEXT,
    created_at  TEXT NOT NULL,
    UNIQUE (owner_id, phone, name)
);

-- NULLs are distinct in UNIQUE constraints, so unnamed rows need their own
-- partial index.
CREATE UNIQUE INDEX IF NOT EXISTS contacts_unnamed_idx
    ON contacts(owner_id, phone) WHERE name IS NULL;

CREATE TABLE IF NOT EXISTS spam_reports (
    report_id   TEXT PRIMARY KEY,
    phone       TEXT NOT NULL REFERENCES directory(phone) ON DELETE CASCADE,
    reporter_id TEXT REFERENCES users(user_id) ON DELETE SET NULL,
    name        TEXT,
    created_at  TEXT NOT NULL,
    UNIQUE (phone, reporter_id, name)
);

CREATE UNIQUE INDEX IF NOT EXISTS spam_reports_unnamed_idx
    ON spam_reports(phone, reporter_id) WHERE name IS NULL;

CREATE INDEX IF NOT EXISTS users_username_idx    ON users(username);
CREATE INDEX IF NOT EXISTS contacts_phone_idx    ON contacts(phone);
CREATE INDEX IF NOT EXISTS contacts_name_idx     ON contacts(name);
CREATE INDEX IF NOT EXISTS spam_reports_name_idx ON spam_reports(name);

PRAGMA user_version = 1;
";
