use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{info, warn};

use crate::engine::Engine;
use crate::limits::*;
use crate::notify::NotifyHub;

/// Manages per-shop engines. Each shop gets its own Engine + WAL + compactor.
/// Shop = database name from the wire connection.
pub struct ShopDirectory {
    engines: DashMap<String, Arc<Engine>>,
    data_dir: PathBuf,
    compact_threshold: u64,
}

impl ShopDirectory {
    pub fn new(data_dir: PathBuf, compact_threshold: u64) -> Self {
        Self {
            engines: DashMap::new(),
            data_dir,
            compact_threshold,
        }
    }

    /// Get or lazily create an engine for the given shop.
    pub fn get_or_create(&self, shop: &str) -> std::io::Result<Arc<Engine>> {
        if let Some(engine) = self.engines.get(shop) {
            return Ok(engine.value().clone());
        }
        if shop.len() > MAX_SHOP_NAME_LEN {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "shop name too long",
            ));
        }
        if self.engines.len() >= MAX_SHOPS {
            return Err(std::io::Error::other("too many shops"));
        }

        // Sanitize shop name to prevent path traversal
        let safe_name: String = shop
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if safe_name.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty shop name",
            ));
        }

        let wal_path = self.data_dir.join(format!("{safe_name}.wal"));
        let notify = Arc::new(NotifyHub::new());
        let engine = Arc::new(Engine::new(wal_path, notify)?);

        let compactor_engine = engine.clone();
        let threshold = self.compact_threshold;
        tokio::spawn(async move {
            run_compactor(compactor_engine, threshold).await;
        });

        self.engines.insert(shop.to_string(), engine.clone());
        metrics::gauge!(crate::observability::SHOPS_ACTIVE).set(self.engines.len() as f64);
        Ok(engine)
    }
}

/// Background task: fold a shop's WAL once enough appends accumulate.
pub async fn run_compactor(engine: Arc<Engine>, threshold: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        let appended = engine.wal_appends_since_compact().await;
        if appended < threshold {
            continue;
        }
        match engine.compact_wal().await {
            Ok(()) => {
                metrics::counter!(crate::observability::WAL_COMPACTIONS_TOTAL).increment(1);
                info!("compacted wal after {appended} appends");
            }
            Err(e) => warn!("wal compaction failed: {e}"),
        }
    }
}
