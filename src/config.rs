use anyhow::Context;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Store settings read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to the QPerform Postgres instance")?;
        let max_connections = parse_max_connections(std::env::var("QPERFORM_MAX_CONNECTIONS").ok())?;

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

fn parse_max_connections(raw: Option<String>) -> anyhow::Result<u32> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_MAX_CONNECTIONS),
        Some(value) => {
            let parsed: u32 = value
                .parse()
                .with_context(|| format!("QPERFORM_MAX_CONNECTIONS must be a positive integer, got {value:?}"))?;
            anyhow::ensure!(parsed > 0, "QPERFORM_MAX_CONNECTIONS must be at least 1");
            Ok(parsed)
        }
    }
}
