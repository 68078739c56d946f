//! SQLite PRAGMA handling.
//!
//! PRAGMAs ride in the DSN query (`?journal_mode=WAL&synchronous=NORMAL`),
//! are stripped before the DSN reaches sqlx and applied per connection.
//! File databases default to WAL with `synchronous=NORMAL`.

use std::time::Duration;

use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use url::Url;

const PRAGMA_PARAMS: &[&str] = &["wal", "synchronous", "busy_timeout", "journal_mode"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JournalMode {
    Delete,
    Wal,
    Memory,
    Truncate,
    Persist,
    Off,
}

impl JournalMode {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DELETE" => Some(Self::Delete),
            "WAL" => Some(Self::Wal),
            "MEMORY" => Some(Self::Memory),
            "TRUNCATE" => Some(Self::Truncate),
            "PERSIST" => Some(Self::Persist),
            "OFF" => Some(Self::Off),
            _ => None,
        }
    }

    fn to_sqlx(self) -> SqliteJournalMode {
        match self {
            Self::Delete => SqliteJournalMode::Delete,
            Self::Wal => SqliteJournalMode::Wal,
            Self::Memory => SqliteJournalMode::Memory,
            Self::Truncate => SqliteJournalMode::Truncate,
            Self::Persist => SqliteJournalMode::Persist,
            Self::Off => SqliteJournalMode::Off,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncMode {
    Off,
    Normal,
    Full,
    Extra,
}

impl SyncMode {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OFF" => Some(Self::Off),
            "NORMAL" => Some(Self::Normal),
            "FULL" => Some(Self::Full),
            "EXTRA" => Some(Self::Extra),
            _ => None,
        }
    }

    fn to_sqlx(self) -> SqliteSynchronous {
        match self {
            Self::Off => SqliteSynchronous::Off,
            Self::Normal => SqliteSynchronous::Normal,
            Self::Full => SqliteSynchronous::Full,
            Self::Extra => SqliteSynchronous::Extra,
        }
    }
}

/// PRAGMAs found in a DSN. Unset fields fall back to [`Pragmas::apply`] defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pragmas {
    pub journal_mode: Option<JournalMode>,
    pub synchronous: Option<SyncMode>,
    pub busy_timeout_ms: Option<u64>,
}

impl Pragmas {
    /// Split a SQLite DSN into the DSN sqlx should see and the PRAGMAs it carried.
    /// Non-URL DSNs (`sqlite::memory:`) come back untouched.
    pub fn extract(dsn: &str) -> (String, Pragmas) {
        let Ok(mut url) = Url::parse(dsn) else {
            return (dsn.to_string(), Pragmas::default());
        };

        let mut pragmas = Pragmas::default();
        let mut wal_toggle = None;
        let mut kept = Vec::new();
        for (key, value) in url.query_pairs() {
            let lower = key.to_ascii_lowercase();
            if !PRAGMA_PARAMS.contains(&lower.as_str()) {
                kept.push(format!("{key}={value}"));
                continue;
            }
            match lower.as_str() {
                "journal_mode" => match JournalMode::parse(&value) {
                    Some(mode) => pragmas.journal_mode = Some(mode),
                    None => tracing::warn!("Invalid 'journal_mode' PRAGMA value '{value}', ignoring"),
                },
                "synchronous" => match SyncMode::parse(&value) {
                    Some(mode) => pragmas.synchronous = Some(mode),
                    None => tracing::warn!("Invalid 'synchronous' PRAGMA value '{value}', ignoring"),
                },
                "busy_timeout" => match value.parse::<u64>() {
                    Ok(ms) => pragmas.busy_timeout_ms = Some(ms),
                    Err(_) => tracing::warn!("Invalid 'busy_timeout' PRAGMA value '{value}', ignoring"),
                },
                _ => match value.to_ascii_lowercase().as_str() {
                    "true" | "1" => wal_toggle = Some(true),
                    "false" | "0" => wal_toggle = Some(false),
                    _ => tracing::warn!("Invalid 'wal' PRAGMA value '{value}', ignoring"),
                },
            }
        }

        // legacy `wal=` only counts when journal_mode is absent
        if pragmas.journal_mode.is_none() {
            pragmas.journal_mode = wal_toggle.map(|on| {
                if on {
                    JournalMode::Wal
                } else {
                    JournalMode::Delete
                }
            });
        }

        url.set_query(None);
        if !kept.is_empty() {
            url.set_query(Some(&kept.join("&")));
        }
        (url.to_string(), pragmas)
    }

    /// Apply to sqlx connect options. `busy_timeout_ms` from the database config
    /// is used when the DSN did not name one.
    pub fn apply(
        &self,
        opts: SqliteConnectOptions,
        in_memory: bool,
        busy_timeout_ms: Option<u64>,
    ) -> SqliteConnectOptions {
        let journal = match (self.journal_mode, in_memory) {
            (Some(mode), _) => mode,
            // in-memory databases cannot use WAL
            (None, true) => JournalMode::Memory,
            (None, false) => JournalMode::Wal,
        };
        let mut opts = opts
            .journal_mode(journal.to_sqlx())
            .synchronous(self.synchronous.unwrap_or(SyncMode::Normal).to_sqlx());
        if let Some(ms) = self.busy_timeout_ms.or(busy_timeout_ms) {
            opts = opts.busy_timeout(Duration::from_millis(ms));
        }
        opts
    }
}
