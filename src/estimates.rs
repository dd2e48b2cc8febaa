use crate::api_types::{CachedStopEstimate, MapRoute, RouteDirectionTime};
use crate::state::AppState;
use compact_str::CompactString;
use futures::future::join_all;
use std::collections::HashSet;

pub struct EstimateCycle {
    pub committed: bool,
    pub fetched: usize,
    pub failed: usize,
}

/// Fetches departure estimates for every stop of the selected route and
/// replaces the cached array once all requests settle. A stop that fails is
/// left out; the rest still land. Results are dropped if the selection moved on.
pub async fn load_stop_estimates(state: &AppState) -> EstimateCycle {
    let (route, token, generation) = {
        let store = state.store.read().await;
        match (&store.selected_route, &store.auth_token) {
            (Some(route), Some(token)) => {
                (route.clone(), token.clone(), store.selection_generation)
            }
            _ => {
                return EstimateCycle {
                    committed: false,
                    fetched: 0,
                    failed: 0,
                };
            }
        }
    };

    let direction_keys = route.direction_keys();
    let stop_codes = unique_stop_codes(&route);
    log::debug!(
        "Fetching estimates for {} stops on route {}",
        stop_codes.len(),
        route.key
    );

    let requests = stop_codes.iter().map(|code| {
        let direction_keys = &direction_keys;
        let route_key = route.key.as_str();
        let token = token.as_str();
        async move {
            let result = state
                .api
                .get_next_departure_times(route_key, direction_keys, code, token)
                .await;
            (code.clone(), result)
        }
    });

    let mut estimates = Vec::with_capacity(stop_codes.len());
    let mut failed = 0;
    for (stop_code, result) in join_all(requests).await {
        match result {
            Ok(departure_times) => estimates.push(CachedStopEstimate {
                stop_code,
                departure_times,
            }),
            Err(e) => {
                log::error!("Estimate for stop {} failed: {}", stop_code, e);
                failed += 1;
            }
        }
    }

    let fetched = estimates.len();
    let mut store = state.store.write().await;
    if store.selection_generation != generation || store.selected_route.is_none() {
        log::debug!("Route {} no longer selected, dropping estimates", route.key);
        return EstimateCycle {
            committed: false,
            fetched,
            failed,
        };
    }

    store.stop_estimates = estimates;
    if failed > 0 {
        store.pending_alerts.push(crate::state::UserAlert::generic());
    }
    EstimateCycle {
        committed: true,
        fetched,
        failed,
    }
}

/// Stop codes across all pattern paths, first occurrence order.
pub fn unique_stop_codes(route: &MapRoute) -> Vec<CompactString> {
    let mut seen = HashSet::new();
    route
        .stops()
        .filter(|s| seen.insert(s.stop_code.clone()))
        .map(|s| s.stop_code.clone())
        .collect()
}

/// The direction times for `stop_code` in `direction_key`, if estimates have them.
pub fn direction_times<'a>(
    estimates: &'a [CachedStopEstimate],
    stop_code: &str,
    direction_key: &str,
) -> Option<&'a RouteDirectionTime> {
    estimates
        .iter()
        .find(|e| e.stop_code == stop_code)?
        .departure_times
        .route_direction_times
        .iter()
        .find(|t| t.direction_key == direction_key)
}
