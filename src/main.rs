use anyhow::{Context, Result};
use std::sync::Arc;

mod alerts;
mod api_types;
mod client;
mod config;
mod estimates;
mod favorites;
mod loader;
mod map;
mod route_details;
mod route_list;
mod server;
mod state;
mod storage;
mod viewport;

use client::SpiritClient;
use config::Config;
use favorites::Favorites;
use loader::load_initial_data;
use state::AppState;
use storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1. Configuration
    let config = Config::from_env()?;
    log::info!(
        "Starting with API {} and data dir {}",
        config.api_url,
        config.data_dir.display()
    );

    // 2. Initialize State
    let client = SpiritClient::new(&config.api_url).context("building HTTP client")?;
    let storage = Storage::new(&config.data_dir);
    let state = Arc::new(AppState::new(Box::new(client), Favorites::new(storage)));

    // 3. Initial data load (token, base data, pattern paths). The server comes
    // up right away and reports `loading` until routes land.
    let state_clone_load = state.clone();
    tokio::spawn(async move {
        load_initial_data(&state_clone_load).await;
    });

    // 4. Log sheet changes for whoever is watching the console.
    let mut sheets = state.subscribe_sheets();
    tokio::spawn(async move {
        while sheets.changed().await.is_ok() {
            log::info!("Sheet presented: {:?}", *sheets.borrow());
        }
    });

    // 5. HTTP Server
    let routes = server::api(state.clone());
    log::info!("Server running at http://localhost:{}", config.port);
    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}
