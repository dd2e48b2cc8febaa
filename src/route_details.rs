use crate::api_types::{Amenity, MapRoute, NextDepart, PatternPath};
use crate::estimates::direction_times;
use crate::favorites::FavoriteSet;
use crate::map::FALLBACK_COLOR;
use crate::route_list::present_route_list;
use crate::state::{AppState, Store};
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::America::Chicago;
use compact_str::CompactString;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDetailsView {
    pub key: CompactString,
    pub name: String,
    pub short_name: String,
    pub color: String,
    pub is_favorite: bool,
    pub alert_count: usize,
    pub directions: Vec<String>,
    pub selected_direction: usize,
    pub stops: Vec<StopRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopRow {
    pub stop_code: CompactString,
    pub name: String,
    pub departures: Vec<DepartureRow>,
    pub amenities: Vec<Amenity>,
    // The terminus has nothing left to depart to.
    pub disabled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureRow {
    pub display_text: Option<String>,
    pub local_time: Option<String>,
    pub minutes_until: Option<i64>,
    pub is_estimate: bool,
}

/// The path drawn for a direction: the one whose pattern key is the first
/// pattern listed under that direction.
pub fn selected_pattern_path(route: &MapRoute, direction: usize) -> Option<&PatternPath> {
    let pattern_key = &route
        .direction_list
        .get(direction)?
        .pattern_list
        .first()?
        .key;
    route
        .pattern_paths
        .iter()
        .find(|p| &p.pattern_key == pattern_key)
}

pub fn build_route_details(
    store: &Store,
    favorites: &FavoriteSet,
    now: DateTime<Utc>,
) -> Option<RouteDetailsView> {
    let route = store.selected_route.as_ref()?;
    let path = selected_pattern_path(route, store.selected_direction);

    let mut stops: Vec<StopRow> = Vec::new();
    if let Some(path) = path {
        for stop in path.pattern_points.iter().filter_map(|p| p.stop.as_ref()) {
            let departures: Vec<DepartureRow> =
                direction_times(&store.stop_estimates, &stop.stop_code, &path.direction_key)
                    .map(|t| t.next_departs.iter().map(|d| departure_row(d, now)).collect())
                    .unwrap_or_default();
            let amenities = store
                .stop_estimates
                .iter()
                .find(|e| e.stop_code == stop.stop_code)
                .map(|e| e.departure_times.amenities.clone())
                .unwrap_or_default();
            stops.push(StopRow {
                stop_code: stop.stop_code.clone(),
                name: stop.name.clone(),
                departures,
                amenities,
                disabled: false,
            });
        }
    }
    if let Some(last) = stops.last_mut() {
        last.disabled = true;
    }

    Some(RouteDetailsView {
        key: route.key.clone(),
        name: route.name.clone(),
        short_name: route.short_name.clone(),
        color: route.line_color().unwrap_or(FALLBACK_COLOR).to_string(),
        is_favorite: favorites.contains(&route.key),
        alert_count: store
            .service_interruptions
            .iter()
            .filter(|i| i.affects(&route.key))
            .count(),
        directions: route
            .direction_list
            .iter()
            .map(|d| format!("to {}", d.destination))
            .collect(),
        selected_direction: store.selected_direction,
        stops,
    })
}

fn departure_row(depart: &NextDepart, now: DateTime<Utc>) -> DepartureRow {
    let estimated = depart
        .estimated_depart_time_utc
        .as_deref()
        .and_then(parse_depart_time);
    let scheduled = depart
        .scheduled_depart_time_utc
        .as_deref()
        .and_then(parse_depart_time);
    let time = estimated.or(scheduled);

    DepartureRow {
        display_text: depart.display_text.clone(),
        local_time: time.map(|t| t.with_timezone(&Chicago).format("%-I:%M %p").to_string()),
        minutes_until: time.map(|t| (t - now).num_minutes().max(0)),
        is_estimate: estimated.is_some(),
    }
}

/// Accepts RFC 3339 and offset-less timestamps; the latter are UTC.
pub fn parse_depart_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Returns false when the route has no such direction.
pub async fn set_direction(state: &AppState, direction: usize) -> bool {
    let mut store = state.store.write().await;
    let valid = store
        .selected_route
        .as_ref()
        .is_some_and(|r| direction < r.direction_list.len());
    if valid {
        store.selected_direction = direction;
    }
    valid
}

pub async fn close_route_details(state: &AppState) {
    state.store.write().await.clear_selected_route();
    present_route_list(state).await;
}
