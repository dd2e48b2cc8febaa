use crate::state::Store;
use crate::viewport::{DEFAULT_REGION, FitRequest, LatLng, Region, fit_request, route_coordinates};
use compact_str::CompactString;
use serde::Serialize;

pub const FALLBACK_COLOR: &str = "#500000";
const POLYLINE_WIDTH: u32 = 6;
const LIGHTEN_STEP: u8 = 100;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub initial_region: Region,
    pub polylines: Vec<Polyline>,
    pub stop_markers: Vec<StopMarker>,
    pub fit: Option<FitRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Polyline {
    pub route_key: CompactString,
    pub coordinates: Vec<LatLng>,
    pub stroke_color: Option<String>,
    pub stroke_width: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopMarker {
    pub id: String,
    pub coordinate: LatLng,
    pub fill_color: String,
    pub border_color: String,
    pub stop_name: String,
    pub route_name: String,
}

pub fn build_map_view(store: &Store, window_height: f64) -> MapView {
    let polylines = store
        .drawn_routes
        .iter()
        .map(|route| Polyline {
            route_key: route.key.clone(),
            coordinates: route_coordinates([route.as_ref()]),
            stroke_color: route.line_color().map(str::to_string),
            stroke_width: POLYLINE_WIDTH,
        })
        .collect();

    let mut stop_markers = Vec::new();
    if let Some(route) = &store.selected_route {
        let fill = route.line_color().unwrap_or(FALLBACK_COLOR);
        let border = lighten(fill).unwrap_or_else(|| fill.to_string());
        for (i, path) in route.pattern_paths.iter().enumerate() {
            for (j, point) in path.pattern_points.iter().enumerate() {
                let Some(stop) = &point.stop else { continue };
                stop_markers.push(StopMarker {
                    id: format!("{}-{}", i, j),
                    coordinate: LatLng {
                        latitude: point.latitude,
                        longitude: point.longitude,
                    },
                    fill_color: fill.to_string(),
                    border_color: border.clone(),
                    stop_name: stop.name.clone(),
                    route_name: route.short_name.clone(),
                });
            }
        }
    }

    MapView {
        initial_region: DEFAULT_REGION,
        polylines,
        stop_markers,
        fit: fit_request(store.selected_route.as_ref(), &store.drawn_routes, window_height),
    }
}

/// Brightens a `#rrggbb` color by a fixed step per channel, saturating at 255.
pub fn lighten(color: &str) -> Option<String> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        r.saturating_add(LIGHTEN_STEP),
        g.saturating_add(LIGHTEN_STEP),
        b.saturating_add(LIGHTEN_STEP)
    ))
}
