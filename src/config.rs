//! Configuration Module
//!
//! Environment-driven configuration, loaded once at startup into an
//! explicit object that is passed into the components needing it. A
//! malformed value is a fatal startup error, never a silent default.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

/// TTL in seconds assigned to writes that do not carry one.
pub const DEFAULT_TTL: u64 = 60;

// == Config ==
/// Service configuration.
///
/// # Environment Variables
/// - `PORT` - RPC listener port (default: 9000)
/// - `DISCOVERY_NAME` - Name resolved to the candidate peer set
///   (default: "mesh-cache")
/// - `DATABASE_FILE` - Local persistence target (default: "mesh.db")
/// - `DEFAULT_TTL` - Default TTL in seconds (default: 60)
/// - TLS material: see [`TlsMaterial::from_env`]
#[derive(Debug, Clone)]
pub struct Config {
    /// RPC listener port
    pub server_port: u16,
    /// Discovery name for the peer bootstrap
    pub discovery_name: String,
    /// Local persistence target handed to the store
    pub database_file: PathBuf,
    /// Default TTL in seconds for writes without one
    pub default_ttl: u64,
    /// RPC channel TLS material
    pub tls: TlsMaterial,
}

impl Config {
    /// Loads the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        debug!("Reading configuration");
        Ok(Self {
            server_port: env_parse("PORT", 9000)?,
            discovery_name: env::var("DISCOVERY_NAME")
                .unwrap_or_else(|_| "mesh-cache".to_string()),
            database_file: env::var("DATABASE_FILE")
                .unwrap_or_else(|_| "mesh.db".to_string())
                .into(),
            default_ttl: env_parse("DEFAULT_TTL", DEFAULT_TTL)?,
            tls: TlsMaterial::from_env()?,
        })
    }
}

/// Parses an env var, falling back to a default when unset. A set but
/// malformed value is an error.
fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse()
            .map_err(|err| anyhow::anyhow!("environment variable '{}' is invalid: {}", name, err)),
    }
}

// == TLS Material ==
/// PEM material for the RPC channel: server certificate chain, private
/// key, and the CA bundle client certificates are verified against.
#[derive(Clone)]
pub struct TlsMaterial {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
    pub ca_pem: Vec<u8>,
}

// Key material never goes to logs.
impl fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("cert_pem", &format!("{} bytes", self.cert_pem.len()))
            .field("key_pem", &format!("{} bytes", self.key_pem.len()))
            .field("ca_pem", &format!("{} bytes", self.ca_pem.len()))
            .finish()
    }
}

impl TlsMaterial {
    /// Loads TLS material from the environment.
    ///
    /// Each piece comes from a base64-valued environment variable when
    /// set (`TLS_CERT`, `TLS_KEY`, `TLS_CA`), otherwise from a file path
    /// (`TLS_CERT_FILE`, `TLS_KEY_FILE`, `TLS_CA_FILE`, with defaults
    /// under `/etc/tls/`).
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            cert_pem: load_tls_value("TLS_CERT", "TLS_CERT_FILE", "/etc/tls/mesh-cache.server.crt")?,
            key_pem: load_tls_value("TLS_KEY", "TLS_KEY_FILE", "/etc/tls/mesh-cache.server.key")?,
            ca_pem: load_tls_value("TLS_CA", "TLS_CA_FILE", "/etc/tls/mesh-cache.ca.crt")?,
        })
    }
}

/// Loads one piece of TLS material: base64 env value first, file second.
fn load_tls_value(env_var: &str, path_var: &str, default_path: &str) -> Result<Vec<u8>> {
    if let Ok(encoded) = env::var(env_var) {
        debug!("Reading certificate material from environment variable {}", env_var);
        return BASE64
            .decode(encoded.trim())
            .with_context(|| format!("environment variable '{}' is not valid base64", env_var));
    }

    let path = env::var(path_var).unwrap_or_else(|_| default_path.to_string());
    debug!("Reading certificate material from file {}", path);
    std::fs::read(&path).with_context(|| format!("failed to read TLS material from {}", path))
}
