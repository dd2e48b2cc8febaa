use crate::alerts::build_alerts;
use crate::estimates::load_stop_estimates;
use crate::map::build_map_view;
use crate::route_details::{build_route_details, close_route_details, set_direction};
use crate::route_list::{
    favorites_changed, load_favorites, present_route_list, route_list_view, select_route,
    set_category,
};
use crate::state::{AppState, RouteCategory, Sheet};
use crate::viewport::{LatLng, center_on_user};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{Response, json, with_status};
use warp::{Filter, Rejection, Reply};

// iPhone-sized portrait window when the renderer doesn't say.
const DEFAULT_WINDOW_HEIGHT: f64 = 844.0;

#[derive(Deserialize)]
struct MapQuery {
    height: Option<f64>,
}

fn status(code: StatusCode) -> Response {
    with_status(json(&code.canonical_reason()), code).into_response()
}

fn ok() -> Response {
    status(StatusCode::OK)
}

/// View-model endpoints the map renderer polls and posts interactions to.
pub fn api(state: Arc<AppState>) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let with_state = warp::any().map(move || state.clone());

    // GET /sheet
    let sheet = warp::path!("sheet")
        .and(warp::get())
        .and(with_state.clone())
        .map(|state: Arc<AppState>| json(&state.presented_sheet()).into_response());

    // GET /notices
    let notices = warp::path!("notices")
        .and(warp::get())
        .and(with_state.clone())
        .and_then(|state: Arc<AppState>| async move {
            Ok::<_, Infallible>(json(&state.take_alerts().await).into_response())
        });

    // GET /routes
    let route_list = warp::path!("routes")
        .and(warp::get())
        .and(with_state.clone())
        .and_then(|state: Arc<AppState>| async move {
            Ok::<_, Infallible>(json(&route_list_view(&state).await).into_response())
        });

    // PUT /routes/category/{all|favorites}
    let category = warp::path!("routes" / "category" / String)
        .and(warp::put())
        .and(with_state.clone())
        .and_then(|raw: String, state: Arc<AppState>| async move {
            let category = match raw.as_str() {
                "all" => RouteCategory::All,
                "favorites" => RouteCategory::Favorites,
                _ => return Ok::<_, Infallible>(status(StatusCode::BAD_REQUEST)),
            };
            set_category(&state, category).await;
            Ok(ok())
        });

    // POST /routes/present
    let present_list = warp::path!("routes" / "present")
        .and(warp::post())
        .and(with_state.clone())
        .and_then(|state: Arc<AppState>| async move {
            present_route_list(&state).await;
            Ok::<_, Infallible>(ok())
        });

    // POST /routes/{key}/select
    let select = warp::path!("routes" / String / "select")
        .and(warp::post())
        .and(with_state.clone())
        .and_then(|key: String, state: Arc<AppState>| async move {
            let reply = if select_route(&state, &key).await {
                ok()
            } else {
                status(StatusCode::NOT_FOUND)
            };
            Ok::<_, Infallible>(reply)
        });

    // GET /route-details
    let details = warp::path!("route-details")
        .and(warp::get())
        .and(with_state.clone())
        .and_then(|state: Arc<AppState>| async move {
            let favorites = load_favorites(&state).await;
            let store = state.store.read().await;
            let reply = match build_route_details(&store, &favorites, chrono::Utc::now()) {
                Some(view) => json(&view).into_response(),
                None => status(StatusCode::NOT_FOUND),
            };
            Ok::<_, Infallible>(reply)
        });

    // PUT /route-details/direction/{index}
    let direction = warp::path!("route-details" / "direction" / usize)
        .and(warp::put())
        .and(with_state.clone())
        .and_then(|index: usize, state: Arc<AppState>| async move {
            let reply = if set_direction(&state, index).await {
                ok()
            } else {
                status(StatusCode::NOT_FOUND)
            };
            Ok::<_, Infallible>(reply)
        });

    // POST /route-details/refresh
    let refresh = warp::path!("route-details" / "refresh")
        .and(warp::post())
        .and(with_state.clone())
        .and_then(|state: Arc<AppState>| async move {
            let cycle = load_stop_estimates(&state).await;
            let reply = if cycle.committed {
                ok()
            } else {
                status(StatusCode::CONFLICT)
            };
            Ok::<_, Infallible>(reply)
        });

    // POST /route-details/close
    let close = warp::path!("route-details" / "close")
        .and(warp::post())
        .and(with_state.clone())
        .and_then(|state: Arc<AppState>| async move {
            close_route_details(&state).await;
            Ok::<_, Infallible>(ok())
        });

    // GET /alerts
    let alerts = warp::path!("alerts")
        .and(warp::get())
        .and(with_state.clone())
        .and_then(|state: Arc<AppState>| async move {
            let store = state.store.read().await;
            Ok::<_, Infallible>(json(&build_alerts(&store, None)).into_response())
        });

    // POST /alerts/present
    let present_alerts = warp::path!("alerts" / "present")
        .and(warp::post())
        .and(with_state.clone())
        .map(|state: Arc<AppState>| {
            state.present_sheet(Sheet::Alerts);
            ok()
        });

    // GET /map?height=<px>
    let map = warp::path!("map")
        .and(warp::get())
        .and(warp::query::<MapQuery>())
        .and(with_state.clone())
        .and_then(|query: MapQuery, state: Arc<AppState>| async move {
            let height = query.height.unwrap_or(DEFAULT_WINDOW_HEIGHT);
            let store = state.store.read().await;
            Ok::<_, Infallible>(json(&build_map_view(&store, height)).into_response())
        });

    // POST /map/locate
    let locate = warp::path!("map" / "locate")
        .and(warp::post())
        .and(warp::body::json())
        .map(|position: LatLng| json(&center_on_user(position)).into_response());

    // GET /favorites
    let favorites = warp::path!("favorites")
        .and(warp::get())
        .and(with_state.clone())
        .and_then(|state: Arc<AppState>| async move {
            Ok::<_, Infallible>(json(&load_favorites(&state).await).into_response())
        });

    // PUT|DELETE /favorites/{key}
    let favorite_change = warp::path!("favorites" / String)
        .and(warp::put().map(|| true).or(warp::delete().map(|| false)).unify())
        .and(with_state.clone())
        .and_then(|key: String, add: bool, state: Arc<AppState>| async move {
            let result = if add {
                state.favorites.add(&key).await
            } else {
                state.favorites.remove(&key).await
            };
            let reply = match result {
                Ok(favorites) => {
                    favorites_changed(&state, &favorites).await;
                    json(&favorites).into_response()
                }
                Err(e) => {
                    state.report_failure("Saving favorites", &e).await;
                    status(StatusCode::INTERNAL_SERVER_ERROR)
                }
            };
            Ok::<_, Infallible>(reply)
        });

    // POST /favorites/{key}/toggle
    let favorite_toggle = warp::path!("favorites" / String / "toggle")
        .and(warp::post())
        .and(with_state)
        .and_then(|key: String, state: Arc<AppState>| async move {
            let reply = match state.favorites.toggle(&key).await {
                Ok(favorites) => {
                    favorites_changed(&state, &favorites).await;
                    json(&favorites.contains(key.as_str())).into_response()
                }
                Err(e) => {
                    state.report_failure("Saving favorites", &e).await;
                    status(StatusCode::INTERNAL_SERVER_ERROR)
                }
            };
            Ok::<_, Infallible>(reply)
        });

    sheet
        .or(notices)
        .unify()
        .or(route_list)
        .unify()
        .or(category)
        .unify()
        .or(present_list)
        .unify()
        .or(select)
        .unify()
        .or(details)
        .unify()
        .or(direction)
        .unify()
        .or(refresh)
        .unify()
        .or(close)
        .unify()
        .or(alerts)
        .unify()
        .or(present_alerts)
        .unify()
        .or(map)
        .unify()
        .or(locate)
        .unify()
        .or(favorites)
        .unify()
        .or(favorite_change)
        .unify()
        .or(favorite_toggle)
        .unify()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::*;
    use warp::test::request;

    async fn loaded(dir: &std::path::Path) -> Arc<AppState> {
        let state = app_state(FakeApi::default(), dir);
        state
            .store
            .write()
            .await
            .set_routes(vec![bonfire(), bare_route("r02")]);
        state
    }

    #[tokio::test]
    async fn test_select_then_details_then_close() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded(dir.path()).await;
        let filter = api(state.clone());

        let res = request()
            .method("POST")
            .path("/routes/r01/select")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 200);

        let res = request().path("/sheet").reply(&filter).await;
        assert_eq!(res.body().as_ref(), br#""routeDetails""#);

        let res = request().path("/route-details").reply(&filter).await;
        assert_eq!(res.status(), 200);
        let view: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(view["shortName"], "01");
        assert_eq!(view["stops"].as_array().unwrap().len(), 3);

        let res = request()
            .method("PUT")
            .path("/route-details/direction/5")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 404);

        let res = request()
            .method("POST")
            .path("/route-details/close")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 200);
        let res = request().path("/route-details").reply(&filter).await;
        assert_eq!(res.status(), 404);
    }

    #[tokio::test]
    async fn test_unknown_route_and_bad_category() {
        let dir = tempfile::tempdir().unwrap();
        let filter = api(loaded(dir.path()).await);

        let res = request()
            .method("POST")
            .path("/routes/zz/select")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 404);

        let res = request()
            .method("PUT")
            .path("/routes/category/nearby")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 400);
    }

    #[tokio::test]
    async fn test_favorites_round_trip_through_list() {
        let dir = tempfile::tempdir().unwrap();
        let filter = api(loaded(dir.path()).await);

        let res = request()
            .method("PUT")
            .path("/favorites/r02")
            .reply(&filter)
            .await;
        assert_eq!(res.status(), 200);
        assert_eq!(res.body().as_ref(), br#"["r02"]"#);

        request()
            .method("PUT")
            .path("/routes/category/favorites")
            .reply(&filter)
            .await;
        let res = request().path("/routes").reply(&filter).await;
        let view: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(view["category"], "favorites");
        assert_eq!(view["routes"].as_array().unwrap().len(), 1);
        assert_eq!(view["routes"][0]["key"], "r02");

        let res = request()
            .method("DELETE")
            .path("/favorites/r02")
            .reply(&filter)
            .await;
        assert_eq!(res.body().as_ref(), b"[]");
        let res = request().path("/routes").reply(&filter).await;
        let view: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(view["emptyMessage"], "You have no favorited routes.");
    }

    #[tokio::test]
    async fn test_favorite_toggle() {
        let dir = tempfile::tempdir().unwrap();
        let filter = api(loaded(dir.path()).await);

        let res = request()
            .method("POST")
            .path("/favorites/r01/toggle")
            .reply(&filter)
            .await;
        assert_eq!(res.body().as_ref(), b"true");
        let res = request().path("/favorites").reply(&filter).await;
        assert_eq!(res.body().as_ref(), br#"["r01"]"#);
    }

    #[tokio::test]
    async fn test_toggle_off_removes_route_from_favorites_list() {
        let dir = tempfile::tempdir().unwrap();
        let filter = api(loaded(dir.path()).await);

        request()
            .method("PUT")
            .path("/favorites/r02")
            .reply(&filter)
            .await;
        request()
            .method("PUT")
            .path("/routes/category/favorites")
            .reply(&filter)
            .await;

        let res = request()
            .method("POST")
            .path("/favorites/r02/toggle")
            .reply(&filter)
            .await;
        assert_eq!(res.body().as_ref(), b"false");

        let res = request().path("/routes").reply(&filter).await;
        let view: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert!(view["routes"].as_array().unwrap().is_empty());
        assert_eq!(view["emptyMessage"], "You have no favorited routes.");

        let res = request()
            .method("POST")
            .path("/favorites/r01/toggle")
            .reply(&filter)
            .await;
        assert_eq!(res.body().as_ref(), b"true");
        let res = request().path("/routes").reply(&filter).await;
        let view: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(view["routes"][0]["key"], "r01");
    }

    #[tokio::test]
    async fn test_map_and_locate() {
        let dir = tempfile::tempdir().unwrap();
        let filter = api(loaded(dir.path()).await);

        let res = request().path("/map?height=1000").reply(&filter).await;
        let view: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(view["polylines"].as_array().unwrap().len(), 2);
        assert_eq!(view["fit"]["coordinates"].as_array().unwrap().len(), 6);
        assert_eq!(view["fit"]["edgePadding"]["top"], 50.0);

        let res = request()
            .method("POST")
            .path("/map/locate")
            .json(&LatLng {
                latitude: 30.62,
                longitude: -96.33,
            })
            .reply(&filter)
            .await;
        let anim: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(anim["durationMs"], 250);
        assert_eq!(anim["region"]["latitudeDelta"], 0.005);
    }

    #[tokio::test]
    async fn test_notices_drain() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded(dir.path()).await;
        state
            .report_failure("test", &anyhow::anyhow!("offline"))
            .await;
        let filter = api(state);

        let res = request().path("/notices").reply(&filter).await;
        let notices: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(notices[0]["title"], "Something went wrong");

        let res = request().path("/notices").reply(&filter).await;
        assert_eq!(res.body().as_ref(), b"[]");
    }
}
