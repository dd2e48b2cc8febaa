use crate::api_types::MapRoute;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_REGION: Region = Region {
    latitude: 30.6060,
    longitude: -96.3462,
    latitude_delta: 0.10,
    longitude_delta: 0.01,
};

const USER_REGION_DELTA: f64 = 0.005;
const USER_REGION_ANIMATION_MS: u32 = 250;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub latitude: f64,
    pub longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EdgePadding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl EdgePadding {
    /// Keeps routes clear of the status bar on top and the half-open sheet below.
    pub fn for_window_height(height: f64) -> Self {
        Self {
            top: height * 0.05,
            right: 20.0,
            bottom: height * 0.45 + 8.0,
            left: 20.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitRequest {
    pub coordinates: Vec<LatLng>,
    pub edge_padding: EdgePadding,
    pub animated: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionAnimation {
    pub region: Region,
    pub duration_ms: u32,
}

/// Every point of every path of `routes`, in order, duplicates kept.
pub fn route_coordinates<'a>(routes: impl IntoIterator<Item = &'a MapRoute>) -> Vec<LatLng> {
    routes
        .into_iter()
        .flat_map(|r| r.pattern_paths.iter())
        .flat_map(|p| p.pattern_points.iter())
        .map(|p| LatLng {
            latitude: p.latitude,
            longitude: p.longitude,
        })
        .collect()
}

/// Fit request for the selected route, or for the drawn routes when nothing
/// is selected. `None` when there is nothing to fit.
pub fn fit_request(
    selected: Option<&Arc<MapRoute>>,
    drawn: &[Arc<MapRoute>],
    window_height: f64,
) -> Option<FitRequest> {
    let coordinates = match selected {
        Some(route) => route_coordinates([route.as_ref()]),
        None => route_coordinates(drawn.iter().map(|r| r.as_ref())),
    };
    if coordinates.is_empty() {
        return None;
    }
    Some(FitRequest {
        coordinates,
        edge_padding: EdgePadding::for_window_height(window_height),
        animated: true,
    })
}

pub fn center_on_user(position: LatLng) -> RegionAnimation {
    RegionAnimation {
        region: Region {
            latitude: position.latitude,
            longitude: position.longitude,
            latitude_delta: USER_REGION_DELTA,
            longitude_delta: USER_REGION_DELTA,
        },
        duration_ms: USER_REGION_ANIMATION_MS,
    }
}
