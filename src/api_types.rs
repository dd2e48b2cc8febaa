use compact_str::CompactString;
use serde::{Deserialize, Serialize};

// GetBaseData response: routes come back without patternPaths, those are fetched separately.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseData {
    pub routes: Vec<MapRoute>,
    #[serde(default)]
    pub service_interruptions: Vec<ServiceInterruption>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapRoute {
    pub key: CompactString,
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub direction_list: Vec<DirectionList>,
    #[serde(default)]
    pub pattern_paths: Vec<PatternPath>,
}

impl MapRoute {
    pub fn line_color(&self) -> Option<&str> {
        self.direction_list.first().map(|d| d.line_color.as_str())
    }

    pub fn destinations(&self) -> Vec<String> {
        self.direction_list
            .iter()
            .map(|d| d.destination.clone())
            .collect()
    }

    /// Every stop of every pattern path, in path order. Stops shared by both
    /// directions appear once per path.
    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.pattern_paths
            .iter()
            .flat_map(|p| p.pattern_points.iter())
            .filter_map(|p| p.stop.as_ref())
    }

    pub fn direction_keys(&self) -> Vec<CompactString> {
        self.pattern_paths
            .iter()
            .map(|p| p.direction_key.clone())
            .collect()
    }

    pub fn point_count(&self) -> usize {
        self.pattern_paths
            .iter()
            .map(|p| p.pattern_points.len())
            .sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionList {
    #[serde(default)]
    pub direction: Option<Direction>,
    pub destination: String,
    pub line_color: String,
    #[serde(default)]
    pub pattern_list: Vec<PatternRef>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    pub key: CompactString,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternRef {
    pub key: CompactString,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternPath {
    pub pattern_key: CompactString,
    pub direction_key: CompactString,
    #[serde(default)]
    pub pattern_points: Vec<PatternPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub stop: Option<Stop>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub stop_code: CompactString,
    pub name: String,
}

// GetPatternPaths response entry, one per requested route.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePatternPaths {
    pub route_key: CompactString,
    #[serde(default)]
    pub pattern_paths: Vec<PatternPath>,
}

pub type PatternPathsResponse = Vec<RoutePatternPaths>;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInterruption {
    pub key: CompactString,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub route_keys: Vec<CompactString>,
}

impl ServiceInterruption {
    /// Interruptions without route keys are network-wide.
    pub fn affects(&self, route_key: &str) -> bool {
        self.route_keys.is_empty() || self.route_keys.iter().any(|k| k == route_key)
    }
}

// GetNextDepartTimes response for a single stop.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDepartTimes {
    #[serde(default)]
    pub route_direction_times: Vec<RouteDirectionTime>,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDirectionTime {
    pub route_key: CompactString,
    pub direction_key: CompactString,
    #[serde(default)]
    pub next_departs: Vec<NextDepart>,
}

// Times are kept as the raw strings the API returns; some carry an offset, some don't.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDepart {
    #[serde(default)]
    pub estimated_depart_time_utc: Option<String>,
    #[serde(default)]
    pub scheduled_depart_time_utc: Option<String>,
    #[serde(default)]
    pub display_text: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amenity {
    pub name: String,
    #[serde(default)]
    pub icon_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedStopEstimate {
    pub stop_code: CompactString,
    pub departure_times: NextDepartTimes,
}
