use serde::{Deserialize, Serialize};

use foundation::bounds::GeoBounds;
use foundation::time::CalendarDate;

pub const DEFAULT_DATASET: &str = "landsat_ot_c2_l2";
pub const DEFAULT_MAX_CLOUD_COVER: f64 = 30.0;
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// One acquisition returned by a scene search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub entity_id: String,
    pub display_id: String,
    pub acquisition_date: CalendarDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<GeoBounds>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneQuery {
    pub dataset: String,
    pub start: CalendarDate,
    pub end: CalendarDate,
    pub max_cloud_cover: f64,
    pub max_results: usize,
}

impl SceneQuery {
    pub fn new(start: CalendarDate, end: CalendarDate) -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            start,
            end,
            max_cloud_cover: DEFAULT_MAX_CLOUD_COVER,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = dataset.into();
        self
    }

    pub fn with_max_cloud_cover(mut self, percent: f64) -> Self {
        self.max_cloud_cover = percent;
        self
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.start > self.end {
            return Err(CatalogError::InvalidQuery(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        if !(0.0..=100.0).contains(&self.max_cloud_cover) {
            return Err(CatalogError::InvalidQuery(format!(
                "cloud cover limit {} outside 0..=100",
                self.max_cloud_cover
            )));
        }
        Ok(())
    }

    fn matches(&self, scene: &Scene) -> bool {
        let in_range = scene.acquisition_date >= self.start && scene.acquisition_date <= self.end;
        // Unknown cover cannot satisfy a cover limit.
        let clear = scene
            .cloud_cover
            .is_some_and(|c| c.is_finite() && c <= self.max_cloud_cover);
        in_range && clear
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Unavailable,
    UnknownDataset(String),
    InvalidQuery(String),
    Corrupt(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Unavailable => write!(f, "scene catalog unavailable"),
            CatalogError::UnknownDataset(name) => write!(f, "unknown dataset: {name}"),
            CatalogError::InvalidQuery(msg) => write!(f, "invalid scene query: {msg}"),
            CatalogError::Corrupt(msg) => write!(f, "scene catalog data corrupt: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Source of dated scenes for before/after picking.
pub trait SceneCatalog {
    fn search(&self, query: &SceneQuery) -> Result<Vec<Scene>, CatalogError>;
}

/// Initial before/after picks for a result list: the first scene and the
/// second one (or the first again when only one exists).
pub fn default_pair(scenes: &[Scene]) -> Option<(&Scene, &Scene)> {
    let before = scenes.first()?;
    let after = &scenes[1.min(scenes.len() - 1)];
    Some((before, after))
}

/// Fixed scene list keyed by dataset, for tests and offline hosts.
#[derive(Debug, Default, Clone)]
pub struct InMemorySceneCatalog {
    datasets: std::collections::BTreeMap<String, Vec<Scene>>,
}

impl InMemorySceneCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: impl Into<String>, scene: Scene) {
        self.datasets.entry(dataset.into()).or_default().push(scene);
    }

    /// Loads `{ "<dataset>": [scene, ...], ... }`.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let datasets =
            serde_json::from_str(json).map_err(|e| CatalogError::Corrupt(e.to_string()))?;
        Ok(Self { datasets })
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        serde_json::to_string_pretty(&self.datasets)
            .map_err(|e| CatalogError::Corrupt(e.to_string()))
    }

    pub fn scene_count(&self) -> usize {
        self.datasets.values().map(Vec::len).sum()
    }
}

impl SceneCatalog for InMemorySceneCatalog {
    fn search(&self, query: &SceneQuery) -> Result<Vec<Scene>, CatalogError> {
        query.validate()?;
        let scenes = self
            .datasets
            .get(&query.dataset)
            .ok_or_else(|| CatalogError::UnknownDataset(query.dataset.clone()))?;

        let mut out: Vec<Scene> = scenes.iter().filter(|s| query.matches(s)).cloned().collect();
        // Deterministic presentation: oldest first, then id.
        out.sort_by(|a, b| {
            a.acquisition_date
                .cmp(&b.acquisition_date)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        out.truncate(query.max_results);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    fn scene(id: &str, d: &str, cover: Option<f64>) -> Scene {
        Scene {
            entity_id: id.to_string(),
            display_id: format!("LC09_{id}"),
            acquisition_date: date(d),
            cloud_cover: cover,
            browse_url: None,
            bounds: None,
        }
    }

    fn catalog() -> InMemorySceneCatalog {
        let mut c = InMemorySceneCatalog::new();
        for s in [
            scene("e3", "2024-03-20", Some(12.0)),
            scene("e1", "2024-03-02", Some(5.0)),
            scene("e2", "2024-03-02", Some(29.9)),
            scene("cloudy", "2024-03-05", Some(80.0)),
            scene("unknown", "2024-03-06", None),
            scene("late", "2024-05-01", Some(1.0)),
        ] {
            c.insert(DEFAULT_DATASET, s);
        }
        c
    }

    fn ids(scenes: &[Scene]) -> Vec<&str> {
        scenes.iter().map(|s| s.entity_id.as_str()).collect()
    }

    #[test]
    fn search_filters_by_range_and_cover_then_sorts() {
        let q = SceneQuery::new(date("2024-03-01"), date("2024-03-31"));
        let found = catalog().search(&q).unwrap();
        assert_eq!(ids(&found), vec!["e1", "e2", "e3"]);
    }

    #[test]
    fn search_caps_results() {
        let q = SceneQuery::new(date("2024-01-01"), date("2024-12-31")).with_max_results(2);
        assert_eq!(ids(&catalog().search(&q).unwrap()), vec!["e1", "e2"]);
    }

    #[test]
    fn looser_cover_limit_admits_cloudy_but_not_unknown() {
        let q = SceneQuery::new(date("2024-03-01"), date("2024-03-31")).with_max_cloud_cover(100.0);
        let found = catalog().search(&q).unwrap();
        assert!(found.iter().any(|s| s.entity_id == "cloudy"));
        assert!(!found.iter().any(|s| s.entity_id == "unknown"));
    }

    #[test]
    fn invalid_queries_are_rejected() {
        let q = SceneQuery::new(date("2024-04-01"), date("2024-03-01"));
        assert!(matches!(catalog().search(&q), Err(CatalogError::InvalidQuery(_))));

        let q = SceneQuery::new(date("2024-03-01"), date("2024-04-01")).with_dataset("sentinel");
        assert_eq!(
            catalog().search(&q),
            Err(CatalogError::UnknownDataset("sentinel".to_string()))
        );
    }

    #[test]
    fn default_pair_picks_first_two() {
        let q = SceneQuery::new(date("2024-03-01"), date("2024-03-31"));
        let found = catalog().search(&q).unwrap();
        let (b, a) = default_pair(&found).unwrap();
        assert_eq!((b.entity_id.as_str(), a.entity_id.as_str()), ("e1", "e2"));

        let single = &found[..1];
        let (b, a) = default_pair(single).unwrap();
        assert_eq!(b, a);
        assert!(default_pair(&[]).is_none());
    }

    #[test]
    fn json_uses_camel_case_and_round_trips() {
        let c = catalog();
        let json = c.to_json().unwrap();
        assert!(json.contains("\"entityId\""));
        assert!(json.contains("\"acquisitionDate\": \"2024-03-20\""));
        let back = InMemorySceneCatalog::from_json(&json).unwrap();
        assert_eq!(back.scene_count(), 6);
        assert!(matches!(
            InMemorySceneCatalog::from_json("[1,2"),
            Err(CatalogError::Corrupt(_))
        ));
    }
}
