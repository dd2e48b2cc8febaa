use crate::api_types::{MapRoute, PatternPathsResponse};
use crate::route_list::load_favorites;
use crate::state::AppState;
use anyhow::{Context, Result};
use compact_str::CompactString;

/// Startup load: token, base data, geometry, merge, commit. Failures are
/// reported once and leave the store as it was.
pub async fn load_initial_data(state: &AppState) {
    let token = match state.api.get_authentication().await {
        Ok(token) => token,
        Err(e) => {
            state
                .report_failure("Fetching auth token", &anyhow::Error::new(e))
                .await;
            return;
        }
    };
    state.store.write().await.auth_token = Some(token.clone());

    if let Err(e) = load_routes(state, &token).await {
        state.report_failure("Loading route data", &e).await;
    }
}

async fn load_routes(state: &AppState, token: &str) -> Result<()> {
    let base_data = state
        .api
        .get_base_data(token)
        .await
        .context("Error while fetching base data")?;

    let route_keys: Vec<CompactString> = base_data.routes.iter().map(|r| r.key.clone()).collect();
    let pattern_paths = state
        .api
        .get_pattern_paths(&route_keys, token)
        .await
        .context("Error while fetching pattern paths")?;

    let mut routes = base_data.routes;
    let attached = add_pattern_paths_to_routes(&mut routes, pattern_paths);
    log::info!(
        "Loaded {} routes ({} with geometry), {} service interruptions",
        routes.len(),
        attached,
        base_data.service_interruptions.len()
    );

    // The category may already be switched to favorites while this load ran.
    let favorites = load_favorites(state).await;
    let mut store = state.store.write().await;
    store.set_routes(routes);
    if store.selected_route.is_none() {
        store.sync_drawn_routes(&favorites);
    }
    store.service_interruptions = base_data.service_interruptions;
    Ok(())
}

/// Attaches each geometry entry to the route with the same key. Routes with no
/// entry keep what they had. Returns how many entries found a route.
pub fn add_pattern_paths_to_routes(routes: &mut [MapRoute], response: PatternPathsResponse) -> usize {
    let mut attached = 0;
    for entry in response {
        match routes.iter_mut().find(|r| r.key == entry.route_key) {
            Some(route) => {
                route.pattern_paths = entry.pattern_paths;
                attached += 1;
            }
            None => log::debug!("No route for pattern paths of {}", entry.route_key),
        }
    }
    attached
}
