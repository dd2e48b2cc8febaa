use crate::api_types::{CachedStopEstimate, MapRoute, ServiceInterruption};
use crate::client::TransitApi;
use crate::favorites::{Favorites, filter_favorites};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

pub const ALERT_TITLE: &str = "Something went wrong";
pub const ALERT_MESSAGE: &str = "Some features may not work correctly. Please try again later.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sheet {
    RoutesList,
    RouteDetails,
    Alerts,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RouteCategory {
    #[default]
    All,
    Favorites,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserAlert {
    pub title: &'static str,
    pub message: &'static str,
}

impl UserAlert {
    pub fn generic() -> Self {
        Self {
            title: ALERT_TITLE,
            message: ALERT_MESSAGE,
        }
    }
}

#[derive(Default)]
pub struct Store {
    pub auth_token: Option<CompactString>,
    pub routes: Vec<Arc<MapRoute>>,
    // Always shares its Arcs with `routes`.
    pub drawn_routes: Vec<Arc<MapRoute>>,
    pub selected_route: Option<Arc<MapRoute>>,
    pub selected_direction: usize,
    pub route_category: RouteCategory,
    // Bumped on every select and clear; an estimate cycle only commits if it
    // still matches when the fetch settles.
    pub selection_generation: u64,
    pub stop_estimates: Vec<CachedStopEstimate>,
    pub service_interruptions: Vec<ServiceInterruption>,
    pub pending_alerts: Vec<UserAlert>,
}

impl Store {
    pub fn set_routes(&mut self, routes: Vec<MapRoute>) {
        self.routes = routes.into_iter().map(Arc::new).collect();
        self.drawn_routes = self.routes.clone();
    }

    pub fn find_route(&self, key: &str) -> Option<Arc<MapRoute>> {
        self.routes.iter().find(|r| r.key == key).cloned()
    }

    /// Drawn routes for the current category. Favorites filter the full route list.
    pub fn sync_drawn_routes(&mut self, favorites: &crate::favorites::FavoriteSet) {
        self.drawn_routes = match self.route_category {
            RouteCategory::All => self.routes.clone(),
            RouteCategory::Favorites => filter_favorites(&self.routes, favorites),
        };
    }

    /// Selects a route and draws only it.
    pub fn select(&mut self, route: Arc<MapRoute>) {
        self.selection_generation += 1;
        self.selected_direction = 0;
        self.stop_estimates.clear();
        self.drawn_routes = vec![route.clone()];
        self.selected_route = Some(route);
    }

    pub fn clear_selected_route(&mut self) {
        self.selection_generation += 1;
        self.selected_route = None;
        self.selected_direction = 0;
        self.stop_estimates.clear();
    }
}

pub struct AppState {
    pub store: RwLock<Store>,
    pub api: Box<dyn TransitApi>,
    pub favorites: Favorites,
    sheet: watch::Sender<Sheet>,
}

impl AppState {
    pub fn new(api: Box<dyn TransitApi>, favorites: Favorites) -> Self {
        let (sheet, _) = watch::channel(Sheet::RoutesList);
        Self {
            store: RwLock::new(Store::default()),
            api,
            favorites,
            sheet,
        }
    }

    pub fn present_sheet(&self, sheet: Sheet) {
        log::debug!("Presenting sheet {:?}", sheet);
        self.sheet.send_replace(sheet);
    }

    pub fn presented_sheet(&self) -> Sheet {
        *self.sheet.borrow()
    }

    pub fn subscribe_sheets(&self) -> watch::Receiver<Sheet> {
        self.sheet.subscribe()
    }

    /// Logs the failure and queues the generic alert for the renderer.
    pub async fn report_failure(&self, context: &str, error: &anyhow::Error) {
        log::error!("{}: {:#}", context, error);
        self.store
            .write()
            .await
            .pending_alerts
            .push(UserAlert::generic());
    }

    pub async fn take_alerts(&self) -> Vec<UserAlert> {
        std::mem::take(&mut self.store.write().await.pending_alerts)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::api_types::{
        BaseData, DirectionList, NextDepartTimes, PatternPath, PatternPathsResponse, PatternPoint,
        PatternRef, Stop,
    };
    use crate::client::ApiError;
    use crate::storage::Storage;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use tokio::sync::Semaphore;

    /// Canned backend. Stop codes in `failing_stops` answer with a schema error.
    #[derive(Default)]
    pub struct FakeApi {
        pub token: Option<CompactString>,
        pub base: Option<BaseData>,
        pub paths: Option<PatternPathsResponse>,
        pub departures: HashMap<CompactString, NextDepartTimes>,
        pub failing_stops: HashSet<CompactString>,
        pub departure_calls: Arc<Mutex<Vec<CompactString>>>,
        // When set, departure calls wait for a permit before answering.
        pub departure_gate: Option<Arc<Semaphore>>,
    }

    fn schema_error(endpoint: &'static str) -> ApiError {
        let source = serde_json::from_str::<u8>("\"x\"").unwrap_err();
        ApiError::Schema { endpoint, source }
    }

    #[async_trait]
    impl TransitApi for FakeApi {
        async fn get_authentication(&self) -> Result<CompactString, ApiError> {
            self.token.clone().ok_or(ApiError::MissingToken)
        }

        async fn get_base_data(&self, _token: &str) -> Result<BaseData, ApiError> {
            self.base.clone().ok_or_else(|| schema_error("GetBaseData"))
        }

        async fn get_pattern_paths(
            &self,
            _route_keys: &[CompactString],
            _token: &str,
        ) -> Result<PatternPathsResponse, ApiError> {
            self.paths.clone().ok_or_else(|| schema_error("GetPatternPaths"))
        }

        async fn get_next_departure_times(
            &self,
            _route_key: &str,
            _direction_keys: &[CompactString],
            stop_code: &str,
            _token: &str,
        ) -> Result<NextDepartTimes, ApiError> {
            self.departure_calls
                .lock()
                .unwrap()
                .push(CompactString::from(stop_code));
            if let Some(gate) = &self.departure_gate {
                let _permit = gate.acquire().await;
            }
            if self.failing_stops.contains(stop_code) {
                return Err(schema_error("GetNextDepartTimes"));
            }
            Ok(self.departures.get(stop_code).cloned().unwrap_or_default())
        }
    }

    pub fn point(lat: f64, lon: f64, stop: Option<(&str, &str)>) -> PatternPoint {
        PatternPoint {
            latitude: lat,
            longitude: lon,
            stop: stop.map(|(code, name)| Stop {
                stop_code: code.into(),
                name: name.to_string(),
            }),
        }
    }

    pub fn path(pattern: &str, direction: &str, points: Vec<PatternPoint>) -> PatternPath {
        PatternPath {
            pattern_key: pattern.into(),
            direction_key: direction.into(),
            pattern_points: points,
        }
    }

    pub fn direction(destination: &str, color: &str, pattern: &str) -> DirectionList {
        DirectionList {
            direction: None,
            destination: destination.to_string(),
            line_color: color.to_string(),
            pattern_list: vec![PatternRef {
                key: pattern.into(),
            }],
        }
    }

    /// Two-direction loop: MSC -> Commons -> Rec outbound, Rec -> MSC inbound.
    pub fn bonfire() -> MapRoute {
        MapRoute {
            key: "r01".into(),
            name: "Bonfire".to_string(),
            short_name: "01".to_string(),
            direction_list: vec![
                direction("Rec Center", "#500000", "p-out"),
                direction("MSC", "#500000", "p-in"),
            ],
            pattern_paths: vec![
                path(
                    "p-out",
                    "d-out",
                    vec![
                        point(30.612, -96.341, Some(("0100", "MSC"))),
                        point(30.613, -96.342, None),
                        point(30.614, -96.343, Some(("0200", "Commons"))),
                        point(30.615, -96.344, Some(("0300", "Rec Center"))),
                    ],
                ),
                path(
                    "p-in",
                    "d-in",
                    vec![
                        point(30.615, -96.344, Some(("0300", "Rec Center"))),
                        point(30.612, -96.341, Some(("0100", "MSC"))),
                    ],
                ),
            ],
        }
    }

    pub fn bare_route(key: &str) -> MapRoute {
        MapRoute {
            key: key.into(),
            name: format!("Route {}", key),
            short_name: key.to_string(),
            direction_list: vec![direction("Somewhere", "#0055aa", "p")],
            pattern_paths: vec![],
        }
    }

    pub fn app_state(api: FakeApi, dir: &std::path::Path) -> Arc<AppState> {
        Arc::new(AppState::new(
            Box::new(api),
            Favorites::new(Storage::new(dir)),
        ))
    }
}
