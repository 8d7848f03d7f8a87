//! Place resolution for region attributes
//!
//! Region values are free-text place names. They are resolved once, at case
//! construction time, into a display name and a coordinate pair. Similarity
//! only ever looks at the resolved coordinates, so no lookup happens while
//! ranking.
//!
//! Unresolvable names do not fail case construction: [`PlaceCache`] turns a
//! [`Error::LookupFailure`] into an unresolved [`Place`], which is at distance
//! zero from every other place.

use crate::{Error, Result};
use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A place name together with its resolved location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Name as it was given
    pub name: String,
    /// Name reported by the resolver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coordinates>,
}

impl Place {
    pub fn resolved(name: impl Into<String>, display_name: impl Into<String>, coords: Coordinates) -> Self {
        Self {
            name: name.into(),
            display_name: Some(display_name.into()),
            coords: Some(coords),
        }
    }

    /// Sentinel for a name the resolver could not find
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            coords: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.coords.is_some()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coords.map(|c| c.lat)
    }

    /// Latitudinal distance in degrees.
    ///
    /// Only latitude is compared: for choosing a holiday, climate follows
    /// latitude far more than longitude. Zero when either side is unresolved.
    pub fn distance(&self, other: &Place) -> f64 {
        match (self.coords, other.coords) {
            (Some(a), Some(b)) => (a.lat - b.lat).abs(),
            _ => 0.0,
        }
    }

    fn renamed(mut self, name: &str) -> Self {
        self.name = name.trim().to_string();
        self
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(display) if display.chars().count() > 25 => {
                let chars: Vec<char> = display.chars().collect();
                let head: String = chars[..10].iter().collect();
                let tail: String = chars[chars.len() - 10..].iter().collect();
                write!(f, "{} ({}...{})", self.name, head.trim(), tail.trim())
            }
            Some(display) => write!(f, "{} ({})", self.name, display),
            None => write!(f, "{} (unresolved)", self.name),
        }
    }
}

/// Resolves free-text place names
pub trait PlaceResolver {
    /// Resolve `name`, failing with [`Error::LookupFailure`] when it is unknown
    fn resolve(&self, name: &str) -> Result<Place>;
}

impl<T: PlaceResolver + ?Sized> PlaceResolver for &T {
    fn resolve(&self, name: &str) -> Result<Place> {
        (**self).resolve(name)
    }
}

/// Gazetteer entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Offline name → location table
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    entries: AHashMap<String, Location>,
}

const BUILTIN_LOCATIONS: &[(&str, &str, f64, f64)] = &[
    ("aegean sea", "Aegean Sea", 39.0, 25.0),
    ("algarve, portugal", "Algarve, Portugal", 37.017954, -7.930834),
    ("allgaeu", "Allgäu, Germany", 47.6, 10.3),
    ("alps", "Alps", 46.5, 10.0),
    ("attica", "Attica, Greece", 38.0, 23.7),
    ("austria", "Austria", 47.516231, 14.550072),
    ("balaton", "Lake Balaton, Hungary", 46.83, 17.73),
    ("bavaria", "Bavaria, Germany", 48.790447, 11.497889),
    ("belgium", "Belgium", 50.503887, 4.469936),
    ("black forest", "Black Forest, Germany", 48.0, 8.2),
    ("bordeaux", "Bordeaux, France", 44.837789, -0.57918),
    ("bulgaria", "Bulgaria", 42.733883, 25.48583),
    ("carinthia", "Carinthia, Austria", 46.72, 14.18),
    ("chalkidiki", "Chalkidiki, Greece", 40.37, 23.44),
    ("corsica", "Corsica, France", 42.039604, 9.012893),
    ("costa blanca, spain", "Costa Blanca, Alicante, Spain", 38.5, -0.23),
    ("costa brava, spain", "Costa Brava, Girona, Spain", 41.97, 3.15),
    ("crete", "Crete, Greece", 35.240117, 24.809269),
    ("cyprus", "Cyprus", 35.126413, 33.429859),
    ("czech republic", "Czech Republic", 49.817492, 15.472962),
    ("denmark", "Denmark", 56.26392, 9.501785),
    ("egypt", "Egypt", 26.820553, 30.802498),
    ("erzgebirge", "Erzgebirge, Germany", 50.58, 13.0),
    ("fanø", "Fanø, Denmark", 55.42, 8.41),
    ("france", "France", 46.227638, 2.213749),
    ("french riviera", "French Riviera, France", 43.7, 7.26),
    ("germany", "Germany", 51.165691, 10.451526),
    ("gran canaria", "Gran Canaria, Spain", 27.92, -15.55),
    ("greece", "Greece", 39.074208, 21.824312),
    ("harz", "Harz, Germany", 51.75, 10.62),
    ("hungary", "Hungary", 47.162494, 19.503304),
    ("ibiza", "Ibiza, Spain", 38.906734, 1.420598),
    ("istanbul", "Istanbul, Turkey", 41.008238, 28.978359),
    ("italy", "Italy", 41.87194, 12.56738),
    ("lake garda", "Lake Garda, Italy", 45.65, 10.64),
    ("lolland", "Lolland, Denmark", 54.77, 11.48),
    ("madeira", "Madeira, Portugal", 32.760707, -16.959472),
    ("mallorca", "Mallorca, Spain", 39.695263, 3.017571),
    ("malta", "Malta", 35.937496, 14.375416),
    ("normandy", "Normandy, France", 48.879701, 0.171253),
    ("north sea", "North Sea", 56.0, 3.0),
    ("poland", "Poland", 51.919438, 19.145136),
    ("portugal", "Portugal", 39.399872, -8.224454),
    ("rhodes", "Rhodes, Greece", 36.434, 28.217),
    ("salzburg", "Salzburg, Austria", 47.80949, 13.05501),
    ("scotland", "Scotland, United Kingdom", 56.490671, -4.202646),
    ("slovakia", "Slovakia", 48.669026, 19.699024),
    ("spain", "Spain", 40.463667, -3.74922),
    ("sweden", "Sweden", 60.128161, 18.643501),
    ("tenerife", "Tenerife, Spain", 28.291564, -16.62913),
    ("thuringian forest", "Thuringian Forest, Germany", 50.68, 10.78),
    ("turkey", "Turkey", 38.963745, 35.243322),
    ("tyrol", "Tyrol, Austria", 47.253741, 11.601487),
    ("wales", "Wales, United Kingdom", 52.130661, -3.783712),
];

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gazetteer covering the regions of the bundled holiday case base
    pub fn builtin() -> Self {
        let mut gazetteer = Self::new();
        for (key, display, lat, lon) in BUILTIN_LOCATIONS {
            gazetteer.insert(key, Location {
                display_name: display.to_string(),
                lat: *lat,
                lon: *lon,
            });
        }
        gazetteer
    }

    /// Load a gazetteer from a JSON object of `name -> location`
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        let entries: std::collections::HashMap<String, Location> = serde_json::from_slice(&data)?;
        let mut gazetteer = Self::new();
        for (name, location) in entries {
            gazetteer.insert(&name, location);
        }
        Ok(gazetteer)
    }

    pub fn insert(&mut self, name: &str, location: Location) {
        self.entries.insert(name.trim().to_lowercase(), location);
    }

    /// Merge `other` into this gazetteer, replacing duplicate names
    pub fn extend(&mut self, other: Gazetteer) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PlaceResolver for Gazetteer {
    fn resolve(&self, name: &str) -> Result<Place> {
        let key = name.trim().to_lowercase();
        self.entries
            .get(&key)
            .map(|loc| Place::resolved(
                name.trim(),
                loc.display_name.clone(),
                Coordinates { lat: loc.lat, lon: loc.lon },
            ))
            .ok_or_else(|| Error::LookupFailure(name.to_string()))
    }
}

/// Spellings in the case files that the gazetteer knows under another name
pub const DEFAULT_CORRECTIONS: &[(&str, &str)] = &[
    ("fano", "fanø"),
    ("czechia", "czech republic"),
    ("erz gebirge", "erzgebirge"),
    ("turkish aegean sea", "aegean sea"),
    ("riviera", "french riviera"),
    ("turkish riviera", "istanbul"),
    ("costa blanca", "costa blanca, spain"),
    ("teneriffe", "tenerife"),
    ("salzberger land", "salzburg"),
    ("costa brava", "costa brava, spain"),
    ("atlantic", "bordeaux"),
    ("algarve", "algarve, portugal"),
    ("allgäu", "allgaeu"),
    ("slowakei", "slovakia"),
];

/// Caching front for a [`PlaceResolver`]
///
/// Owns the lookup cache (keyed by lowercased name) and the correction table
/// applied before a name reaches the underlying resolver. Lookup failures are
/// cached as unresolved places, so a missing name is reported once.
pub struct PlaceCache<R> {
    resolver: R,
    corrections: AHashMap<String, String>,
    cache: Mutex<AHashMap<String, Place>>,
}

impl<R: PlaceResolver> PlaceCache<R> {
    pub fn new(resolver: R) -> Self {
        let corrections = DEFAULT_CORRECTIONS
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self {
            resolver,
            corrections,
            cache: Mutex::new(AHashMap::new()),
        }
    }

    /// Add or replace name corrections
    pub fn with_corrections<I, K, V>(mut self, corrections: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (from, to) in corrections {
            self.corrections.insert(from.into().to_lowercase(), to.into().to_lowercase());
        }
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Number of cached names
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Names cached as unresolved
    pub fn unresolved(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache
            .lock()
            .iter()
            .filter(|(_, place)| !place.is_resolved())
            .map(|(key, _)| key.clone())
            .collect();
        names.sort();
        names
    }

    /// Drop every cached lookup
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    fn corrected<'a>(&'a self, key: &'a str) -> &'a str {
        self.corrections.get(key).map(String::as_str).unwrap_or(key)
    }
}

impl<R: PlaceResolver> PlaceResolver for PlaceCache<R> {
    fn resolve(&self, name: &str) -> Result<Place> {
        let key = name.trim().to_lowercase();
        if let Some(place) = self.cache.lock().get(&key) {
            return Ok(place.clone().renamed(name));
        }

        let lookup = self.corrected(&key);
        let place = match self.resolver.resolve(lookup) {
            Ok(place) => {
                debug!(name, lookup, "resolved place");
                place
            }
            Err(Error::LookupFailure(_)) => {
                warn!(name, lookup, "unable to resolve place, treating it as unresolved");
                Place::unresolved(name.trim())
            }
            Err(e) => return Err(e),
        };

        self.cache.lock().insert(key, place.clone());
        Ok(place.renamed(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingResolver {
        inner: Gazetteer,
        calls: Cell<usize>,
    }

    impl PlaceResolver for CountingResolver {
        fn resolve(&self, name: &str) -> Result<Place> {
            self.calls.set(self.calls.get() + 1);
            self.inner.resolve(name)
        }
    }

    #[test]
    fn test_latitudinal_distance() {
        let gazetteer = Gazetteer::builtin();
        let sweden = gazetteer.resolve("Sweden").unwrap();
        let egypt = gazetteer.resolve("Egypt").unwrap();
        assert!((sweden.distance(&egypt) - 33.307608).abs() < 1e-6);
        assert_eq!(sweden.distance(&egypt), egypt.distance(&sweden));
    }

    #[test]
    fn test_unresolved_distance_is_zero() {
        let gazetteer = Gazetteer::builtin();
        let crete = gazetteer.resolve("Crete").unwrap();
        let nowhere = Place::unresolved("Atlantis");
        assert_eq!(crete.distance(&nowhere), 0.0);
        assert!(!nowhere.is_resolved());
    }

    #[test]
    fn test_gazetteer_missing_name() {
        let gazetteer = Gazetteer::builtin();
        assert!(matches!(gazetteer.resolve("Atlantis"), Err(Error::LookupFailure(_))));
    }

    #[test]
    fn test_cache_applies_corrections() {
        let cache = PlaceCache::new(Gazetteer::builtin());
        let place = cache.resolve("Teneriffe").unwrap();
        assert_eq!(place.name, "Teneriffe");
        assert_eq!(place.display_name.as_deref(), Some("Tenerife, Spain"));
    }

    #[test]
    fn test_cache_hits_by_lowercased_name() {
        let resolver = CountingResolver {
            inner: Gazetteer::builtin(),
            calls: Cell::new(0),
        };
        let cache = PlaceCache::new(resolver);
        let first = cache.resolve("Crete").unwrap();
        let second = cache.resolve("CRETE").unwrap();

        assert_eq!(cache.resolver().calls.get(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(first.coords, second.coords);
        assert_eq!(second.name, "CRETE");
    }

    #[test]
    fn test_cache_substitutes_unresolved_sentinel() {
        let cache = PlaceCache::new(Gazetteer::builtin());
        let place = cache.resolve("Atlantis").unwrap();
        assert!(!place.is_resolved());
        assert_eq!(cache.unresolved(), vec!["atlantis".to_string()]);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_custom_corrections() {
        let cache = PlaceCache::new(Gazetteer::builtin())
            .with_corrections([("Kreta", "Crete")]);
        let place = cache.resolve("kreta").unwrap();
        assert!(place.is_resolved());
    }

    #[test]
    fn test_display_shortens_long_names() {
        let place = Place::resolved(
            "Costa Blanca",
            "Costa Blanca, Alicante, Spain",
            Coordinates { lat: 38.5, lon: -0.23 },
        );
        assert_eq!(place.to_string(), "Costa Blanca (Costa Blan...nte, Spain)");
    }

    #[test]
    fn test_gazetteer_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.json");
        std::fs::write(&path, r#"{"Atlantis": {"display_name": "Atlantis", "lat": 36.4, "lon": 25.4}}"#).unwrap();

        let gazetteer = Gazetteer::from_json_file(&path).unwrap();
        assert_eq!(gazetteer.len(), 1);
        assert!(gazetteer.resolve("atlantis").unwrap().is_resolved());
    }
}
