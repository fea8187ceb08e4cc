//! Store connection configuration.

/// Default Redis host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default Redis port.
pub const DEFAULT_PORT: u16 = 6379;

/// Root under which every topology entity is stored.
pub const DEFAULT_KEY_PREFIX: &str = "/tuplenet/entity_view";

/// Configuration for the topology store connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Redis server hostname or IP
    pub host: String,
    /// Redis server port
    pub port: u16,
    /// Database selector
    pub db: i64,
    /// Key prefix shared by every entity path
    pub key_prefix: String,
}

impl StoreConfig {
    /// Creates a new store configuration with the default key prefix.
    pub fn new(host: impl Into<String>, port: u16, db: i64) -> Self {
        Self {
            host: host.into(),
            port,
            db,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        }
    }

    /// Replaces the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Returns the Redis connection URI.
    pub fn uri(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.uri(), "redis://127.0.0.1:6379/0");
        assert_eq!(config.key_prefix, "/tuplenet/entity_view");
    }

    #[test]
    fn test_with_key_prefix() {
        let config = StoreConfig::new("10.1.1.1", 6380, 3).with_key_prefix("/lab");
        assert_eq!(config.uri(), "redis://10.1.1.1:6380/3");
        assert_eq!(config.key_prefix, "/lab");
    }
}
