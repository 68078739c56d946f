//! Database bootstrap: DSN normalization, backend detection and pooled connect.

use anyhow::{anyhow, Context, Result};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::config::DatabaseConfig;
use crate::sqlite::Pragmas;

pub const MEMORY_DSN: &str = "sqlite::memory:";

const DEFAULT_MAX_CONNS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    Sqlite,
    Postgres,
}

/// Detect DB backend from URL scheme.
pub fn detect_backend(dsn: &str) -> Result<DbBackend> {
    let raw = dsn.trim();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if is_memory_dsn(raw) {
        return Ok(DbBackend::Sqlite);
    }

    let url = Url::parse(raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;
    match url.scheme() {
        "sqlite" | "sqlite3" => Ok(DbBackend::Sqlite),
        "postgres" | "postgresql" => Ok(DbBackend::Postgres),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

fn is_memory_dsn(dsn: &str) -> bool {
    dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
}

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps in-memory DSNs as "sqlite::memory:".
/// - Adds `mode=rwc` when no query is given so the file gets created.
/// - Normalizes backslashes into forward slashes.
pub fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if is_memory_dsn(dsn) {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let (Some(dir), true) = (p.parent(), create_dirs) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating database directory {}", dir.display()))?;
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    out.push('?');
    out.push_str(query.unwrap_or("mode=rwc"));
    Ok(out)
}

/// Resolve the DSN the server should use: `--mock` forces in-memory SQLite,
/// file-based SQLite paths are anchored at `base_dir`.
pub fn resolve_dsn(cfg: &DatabaseConfig, base_dir: &Path, mock: bool) -> Result<String> {
    let configured = cfg.url.trim();
    if configured.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }
    if mock {
        return Ok(MEMORY_DSN.to_string());
    }
    match detect_backend(configured)? {
        DbBackend::Sqlite => absolutize_sqlite_dsn(configured, base_dir, true),
        DbBackend::Postgres => Ok(configured.to_string()),
    }
}

/// Open a pooled connection for an already resolved DSN.
/// SQLite PRAGMAs in the DSN query are applied to every pooled connection.
pub async fn connect(dsn: &str, cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
    let backend = detect_backend(dsn)?;
    let in_memory = is_memory_dsn(dsn);
    let (dsn, pragmas) = match backend {
        DbBackend::Sqlite => Pragmas::extract(dsn),
        DbBackend::Postgres => (dsn.to_owned(), Pragmas::default()),
    };

    let mut opts = ConnectOptions::new(dsn);
    opts.acquire_timeout(ACQUIRE_TIMEOUT).sqlx_logging(false);

    if in_memory {
        // Every pooled connection would otherwise see its own empty database.
        opts.max_connections(1).min_connections(1);
    } else {
        opts.max_connections(cfg.max_conns.unwrap_or(DEFAULT_MAX_CONNS));
    }

    if backend == DbBackend::Sqlite {
        let busy_timeout_ms = cfg.busy_timeout_ms.map(u64::from);
        opts.map_sqlx_sqlite_opts(move |o| pragmas.apply(o, in_memory, busy_timeout_ms));
    }

    tracing::info!(backend = ?backend, "connecting to database");
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("connecting to {:?} database", backend))?;
    Ok(db)
}

/// In-memory SQLite connection for tests and `--mock` runs.
pub async fn connect_memory() -> Result<DatabaseConnection> {
    connect(MEMORY_DSN, &DatabaseConfig::default()).await
}
