use crate::api_types::MapRoute;
use crate::storage::Storage;
use anyhow::{Context, Result};
use compact_str::CompactString;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

const FAVORITES_KEY: &str = "favorites";

pub type FavoriteSet = BTreeSet<CompactString>;

pub struct Favorites {
    storage: Storage,
    // Serializes read-modify-write cycles against the same file.
    write_lock: Mutex<()>,
}

impl Favorites {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Result<FavoriteSet> {
        let Some(raw) = self.storage.get_item(FAVORITES_KEY).await? else {
            return Ok(FavoriteSet::new());
        };
        let keys: Vec<CompactString> =
            serde_json::from_str(&raw).context("favorites are not a JSON list of route keys")?;
        Ok(keys.into_iter().collect())
    }

    pub async fn add(&self, route_key: &str) -> Result<FavoriteSet> {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.load().await?;
        if favorites.insert(CompactString::from(route_key)) {
            self.save(&favorites).await?;
        }
        Ok(favorites)
    }

    pub async fn remove(&self, route_key: &str) -> Result<FavoriteSet> {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.load().await?;
        if favorites.remove(route_key) {
            self.save(&favorites).await?;
        }
        Ok(favorites)
    }

    /// Flips membership of the route and returns the saved set.
    pub async fn toggle(&self, route_key: &str) -> Result<FavoriteSet> {
        let _guard = self.write_lock.lock().await;
        let mut favorites = self.load().await?;
        if !favorites.remove(route_key) {
            favorites.insert(CompactString::from(route_key));
        }
        self.save(&favorites).await?;
        Ok(favorites)
    }

    async fn save(&self, favorites: &FavoriteSet) -> Result<()> {
        let keys: Vec<&CompactString> = favorites.iter().collect();
        let raw = serde_json::to_string(&keys)?;
        self.storage.set_item(FAVORITES_KEY, &raw).await
    }
}

/// Routes whose key is a favorite, in the order of `routes`. Shares the `Arc`s.
pub fn filter_favorites(routes: &[Arc<MapRoute>], favorites: &FavoriteSet) -> Vec<Arc<MapRoute>> {
    routes
        .iter()
        .filter(|r| favorites.contains(&r.key))
        .cloned()
        .collect()
}
