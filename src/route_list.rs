use crate::estimates::load_stop_estimates;
use crate::favorites::FavoriteSet;
use crate::state::{AppState, RouteCategory, Sheet};
use compact_str::CompactString;
use serde::Serialize;
use std::sync::Arc;

const ROW_FALLBACK_COLOR: &str = "#000";
const NO_FAVORITES: &str = "You have no favorited routes.";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteListView {
    pub category: RouteCategory,
    pub loading: bool,
    pub empty_message: Option<&'static str>,
    pub alert_count: usize,
    pub routes: Vec<RouteRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRow {
    pub key: CompactString,
    pub short_name: String,
    pub name: String,
    pub color: String,
    pub destinations: Vec<String>,
    pub is_favorite: bool,
}

/// Favorites from storage. A broken store reads as no favorites, with the failure reported.
pub async fn load_favorites(state: &AppState) -> FavoriteSet {
    match state.favorites.load().await {
        Ok(favorites) => favorites,
        Err(e) => {
            state.report_failure("Loading favorites", &e).await;
            FavoriteSet::new()
        }
    }
}

/// The list shows the drawn routes, which track the category while no route is selected.
pub async fn route_list_view(state: &AppState) -> RouteListView {
    let favorites = load_favorites(state).await;
    let store = state.store.read().await;

    let routes: Vec<RouteRow> = store
        .drawn_routes
        .iter()
        .map(|route| RouteRow {
            key: route.key.clone(),
            short_name: route.short_name.clone(),
            name: route.name.clone(),
            color: route
                .line_color()
                .unwrap_or(ROW_FALLBACK_COLOR)
                .to_string(),
            destinations: route.destinations(),
            is_favorite: favorites.contains(&route.key),
        })
        .collect();

    let empty_message = (store.route_category == RouteCategory::Favorites && routes.is_empty())
        .then_some(NO_FAVORITES);

    RouteListView {
        category: store.route_category,
        loading: store.routes.is_empty(),
        empty_message,
        alert_count: store.service_interruptions.len(),
        routes,
    }
}

/// Redraws the category after the favorite set changed. A selected route
/// keeps the map to itself until details close.
pub async fn favorites_changed(state: &AppState, favorites: &FavoriteSet) {
    let mut store = state.store.write().await;
    if store.selected_route.is_none() {
        store.sync_drawn_routes(favorites);
    }
}

pub async fn set_category(state: &AppState, category: RouteCategory) {
    let favorites = load_favorites(state).await;
    let mut store = state.store.write().await;
    store.route_category = category;
    store.sync_drawn_routes(&favorites);
    log::info!(
        "Route category {:?}: drawing {} routes",
        category,
        store.drawn_routes.len()
    );
}

/// Bringing the list back up re-reads favorites, which may have changed from
/// the details sheet, and matches the map to the category.
pub async fn present_route_list(state: &AppState) {
    let favorites = load_favorites(state).await;
    state.store.write().await.sync_drawn_routes(&favorites);
    state.present_sheet(Sheet::RoutesList);
}

/// Selects a route, draws only it, presents its details and starts the
/// estimate fetch in the background. Returns false for an unknown key.
pub async fn select_route(state: &Arc<AppState>, route_key: &str) -> bool {
    {
        let mut store = state.store.write().await;
        let Some(route) = store.find_route(route_key) else {
            return false;
        };
        store.select(route);
    }
    state.present_sheet(Sheet::RouteDetails);

    let state = state.clone();
    tokio::spawn(async move {
        let cycle = load_stop_estimates(&state).await;
        log::debug!(
            "Estimates: {} fetched, {} failed, committed={}",
            cycle.fetched,
            cycle.failed,
            cycle.committed
        );
    });
    true
}
