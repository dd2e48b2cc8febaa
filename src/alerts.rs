use crate::state::Store;
use compact_str::CompactString;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AlertsView {
    pub alerts: Vec<AlertRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRow {
    pub key: CompactString,
    pub name: String,
    pub description: Option<String>,
    pub route_keys: Vec<CompactString>,
}

/// Service interruptions, optionally narrowed to those touching one route.
pub fn build_alerts(store: &Store, route_key: Option<&str>) -> AlertsView {
    let alerts = store
        .service_interruptions
        .iter()
        .filter(|i| route_key.is_none_or(|k| i.affects(k)))
        .map(|i| AlertRow {
            key: i.key.clone(),
            name: i.name.clone(),
            description: i.description.clone(),
            route_keys: i.route_keys.clone(),
        })
        .collect();
    AlertsView { alerts }
}
