use anyhow::Context;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const MAX_CONNECTIONS_ENV: &str = "DASHBOARD_MAX_CONNECTIONS";
pub const TEACHER_ENV: &str = "DASHBOARD_TEACHER";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    /// Session teacher used when `--teacher` is not given.
    pub default_teacher: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .with_context(|| format!("{DATABASE_URL_ENV} must be set to a Postgres instance"))?;

        let max_connections = match lookup(MAX_CONNECTIONS_ENV) {
            Some(value) => value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| {
                    format!("{MAX_CONNECTIONS_ENV} must be a positive integer, got '{value}'")
                })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let default_teacher = lookup(TEACHER_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            database_url,
            max_connections,
            default_teacher,
        })
    }
}
