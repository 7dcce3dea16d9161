use std::net::SocketAddr;

use anyhow::{Context, Result, anyhow};

use tribune_gateway::{DEFAULT_MAX_LINE_BYTES, DEFAULT_OUTBOUND_CAPACITY, GatewayConfig};

/// Administrator account created at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAdmin {
    pub username: String,
    pub password: String,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub gateway: GatewayConfig,
    pub admin: Option<SeedAdmin>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("TRIBUNE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&lookup, "TRIBUNE_PORT", 5050)?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        let gateway = GatewayConfig {
            max_line_bytes: parse_or(&lookup, "TRIBUNE_MAX_LINE_BYTES", DEFAULT_MAX_LINE_BYTES)?,
            outbound_capacity: parse_or(&lookup, "TRIBUNE_OUTBOUND_CAPACITY", DEFAULT_OUTBOUND_CAPACITY)?,
        };
        if gateway.max_line_bytes == 0 {
            return Err(anyhow!("TRIBUNE_MAX_LINE_BYTES must be at least 1"));
        }
        if gateway.outbound_capacity == 0 {
            return Err(anyhow!("TRIBUNE_OUTBOUND_CAPACITY must be at least 1"));
        }

        let admin = match (lookup("TRIBUNE_ADMIN_USER"), lookup("TRIBUNE_ADMIN_PASS")) {
            (Some(username), Some(password)) => Some(SeedAdmin {
                nickname: lookup("TRIBUNE_ADMIN_NICK").unwrap_or_else(|| username.clone()),
                username,
                password,
            }),
            (None, None) => None,
            _ => return Err(anyhow!("TRIBUNE_ADMIN_USER and TRIBUNE_ADMIN_PASS must be set together")),
        };

        Ok(Self { addr, gateway, admin })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw.parse().with_context(|| format!("{key} has invalid value {raw:?}")),
        None => Ok(default),
    }
}
