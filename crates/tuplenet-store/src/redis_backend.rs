//! Redis database backend for the topology store.
//!
//! Each entity is one string key holding its JSON encoding. Multi-entity
//! writes map onto single Redis commands so they are atomic on the server:
//! `MSET` for upserts, `MSETNX` for insert-if-absent, one `DEL` for removal.
//! Cascade deletes discover children with `SCAN` first; a child written
//! between the scan and the `DEL` survives and is reported by the link
//! consistency check.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, info};
use tuplenet_types::{Entity, EntityKey, EntityKind};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::keys::KeyLayout;
use crate::store::{decode, encode, TopologyStore};

/// Keys requested per SCAN round trip.
const SCAN_BATCH: usize = 256;

/// A [`TopologyStore`] backed by a Redis server.
#[derive(Clone)]
pub struct RedisStore {
    layout: KeyLayout,
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connects to the Redis server named by `config`.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let uri = config.uri();

        let client = redis::Client::open(uri.clone())
            .map_err(|e| StoreError::Config(format!("{}: {}", uri, e)))?;

        let connection = client
            .get_connection_manager()
            .await
            .map_err(|e| StoreError::backend("connect", e))?;

        info!(
            host = %config.host,
            port = config.port,
            db = config.db,
            prefix = %config.key_prefix,
            "Connected to topology store"
        );

        Ok(Self {
            layout: KeyLayout::new(config.key_prefix.clone()),
            connection,
        })
    }

    /// Every key starting with `prefix`, sorted and deduplicated.
    async fn scan(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let pattern = format!("{}*", escape_glob(prefix));
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| StoreError::backend("SCAN", e))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once
        keys.sort();
        keys.dedup();
        debug!(prefix, count = keys.len(), "Scanned store keys");
        Ok(keys)
    }

    fn encode_all(&self, entities: &[Entity]) -> StoreResult<Vec<(String, String)>> {
        entities
            .iter()
            .map(|entity| {
                let path = self.layout.path(&entity.key())?;
                let value = encode(&path, entity)?;
                Ok((path, value))
            })
            .collect()
    }

    async fn first_existing(&self, paths: &[&String]) -> StoreResult<Option<String>> {
        let mut conn = self.connection.clone();
        for path in paths {
            let exists: bool = redis::cmd("EXISTS")
                .arg(path.as_str())
                .query_async(&mut conn)
                .await
                .map_err(|e| StoreError::backend("EXISTS", e))?;
            if exists {
                return Ok(Some((*path).clone()));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl TopologyStore for RedisStore {
    async fn get(&self, key: &EntityKey) -> StoreResult<Entity> {
        let path = self.layout.path(key)?;
        let mut conn = self.connection.clone();

        let value: Option<String> = redis::cmd("GET")
            .arg(&path)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::backend("GET", e))?;

        match value {
            Some(value) => decode(&path, key, &value),
            None => Err(StoreError::not_found(path)),
        }
    }

    async fn get_all(&self, kind: EntityKind, owner: Option<&str>) -> StoreResult<Vec<Entity>> {
        let prefix = self.layout.scan_prefix(kind, owner)?;
        let paths: Vec<String> = self
            .scan(&prefix)
            .await?
            .into_iter()
            .filter(|path| self.layout.matches(path, kind, owner))
            .collect();

        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(&paths)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::backend("MGET", e))?;

        let mut entities = Vec::with_capacity(paths.len());
        for (path, value) in paths.iter().zip(values) {
            // deleted between SCAN and MGET
            let Some(value) = value else { continue };
            let Some(key) = self.layout.parse(path) else {
                continue;
            };
            entities.push(decode(path, &key, &value)?);
        }
        Ok(entities)
    }

    async fn save(&self, entities: &[Entity]) -> StoreResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let encoded = self.encode_all(entities)?;
        let mut conn = self.connection.clone();

        let mut cmd = redis::cmd("MSET");
        for (path, value) in &encoded {
            cmd.arg(path).arg(value);
        }
        let _: () = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::backend("MSET", e))?;

        debug!(count = encoded.len(), "Saved entities");
        Ok(())
    }

    async fn create(&self, entities: &[Entity]) -> StoreResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let encoded = self.encode_all(entities)?;
        let mut conn = self.connection.clone();

        let mut cmd = redis::cmd("MSETNX");
        for (path, value) in &encoded {
            cmd.arg(path).arg(value);
        }
        let written: bool = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::backend("MSETNX", e))?;

        if !written {
            let paths: Vec<&String> = encoded.iter().map(|(path, _)| path).collect();
            let key = match self.first_existing(&paths).await? {
                Some(path) => path,
                None => encoded[0].0.clone(),
            };
            return Err(StoreError::AlreadyExists { key });
        }

        debug!(count = encoded.len(), "Created entities");
        Ok(())
    }

    async fn delete(&self, cascade: bool, entities: &[Entity]) -> StoreResult<()> {
        let mut paths = Vec::with_capacity(entities.len());
        for entity in entities {
            let key = entity.key();
            if cascade {
                if let Some(prefix) = self.layout.children_prefix(&key)? {
                    paths.extend(self.scan(&prefix).await?);
                }
            }
            paths.push(self.layout.path(&key)?);
        }

        if paths.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection.clone();
        let removed: u64 = redis::cmd("DEL")
            .arg(&paths)
            .query_async(&mut conn)
            .await
            .map_err(|e| StoreError::backend("DEL", e))?;

        debug!(cascade, requested = paths.len(), removed, "Deleted entities");
        Ok(())
    }
}

/// Escapes Redis glob metacharacters so `s` matches literally.
fn escape_glob(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
