use anyhow::{bail, Context, Result};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: String,
    pub row_limit: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = match var("DATABASE_URL") {
            Some(url) => url,
            None => {
                // PS_* split credentials, as deployed next to the old dashboard
                let get = |k: &str| var(k).with_context(|| format!("Missing required env var: {k} (or set DATABASE_URL)"));
                let host = get("PS_HOST")?;
                let port: u16 = get("PS_PORT")?
                    .parse()
                    .context("PS_PORT must be a port number")?;
                let user = get("PS_USER")?;
                let password = get("PS_PASSWORD")?;
                let dbname = get("PS_DBNAME")?;
                format!("postgres://{user}:{password}@{host}:{port}/{dbname}")
            }
        };

        let db_max_connections = parse_or(&var, "QC_DB_MAX_CONNECTIONS", 5)?;
        let row_limit = parse_or(&var, "QC_ROW_LIMIT", 500)?;
        let bind_addr = var("QC_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8050".to_string());

        // Tiny sanity checks (fail fast, fail loud)
        if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
            bail!("DATABASE_URL must start with postgres:// or postgresql://");
        }
        if db_max_connections == 0 {
            bail!("QC_DB_MAX_CONNECTIONS must be at least 1");
        }
        if row_limit <= 0 {
            bail!("QC_ROW_LIMIT must be positive");
        }

        Ok(Self {
            database_url,
            db_max_connections,
            bind_addr,
            row_limit,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(v) => v.trim().parse().with_context(|| format!("{key} is not valid: {v:?}")),
        None => Ok(default),
    }
}
