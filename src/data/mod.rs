use crate::map::{assemble, PrimitiveSet, ProjectionMode};
use geojson::{Geometry, Value};
use log::{debug, info, warn};
use serde_json::{Map as JsonObject, Value as JsonValue};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use thiserror::Error;

/// Property keys checked, in order, for a feature's display name
pub const NAME_KEYS: [&str; 2] = ["NAME", "name"];
/// Property keys checked, in order, for a feature's ISO code
pub const CODE_KEYS: [&str; 2] = ["ISO_A3", "iso_a3"];
/// Name used when no alias resolves
pub const UNKNOWN_NAME: &str = "Unknown";

/// A polygon as GeoJSON stores it: rings of `[lon, lat, ..]` positions
pub type PolygonRings = Vec<Vec<Vec<f64>>>;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse GeoJSON: {0}")]
    Parse(#[from] simd_json::Error),
    #[error("document has no `features` array")]
    MissingFeatures,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FeatureGeometry {
    Polygon(PolygonRings),
    MultiPolygon(Vec<PolygonRings>),
    /// Any other geometry type, by GeoJSON type name
    Unsupported(&'static str),
    Missing,
}

/// One country/region record
#[derive(Clone, Debug, PartialEq)]
pub struct GeoFeature {
    pub name: String,
    pub code: String,
    pub properties: JsonObject<String, JsonValue>,
    pub geometry: FeatureGeometry,
}

/// Both projections built from the same feature set
pub struct LoadedSets {
    pub globe: PrimitiveSet,
    pub flat: PrimitiveSet,
}

/// Parse raw GeoJSON text in place
pub fn parse_document(bytes: &mut [u8]) -> Result<JsonValue, LoadError> {
    Ok(simd_json::serde::from_slice::<JsonValue>(bytes)?)
}

/// Read and parse a GeoJSON file
pub fn load_document(path: &Path) -> Result<JsonValue, LoadError> {
    let mut bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("read {} ({} bytes)", path.display(), bytes.len());
    parse_document(&mut bytes)
}

/// Extract features from a FeatureCollection document.
/// Individual malformed features degrade to `FeatureGeometry::Missing`.
pub fn features_from_json(document: &JsonValue) -> Result<Vec<GeoFeature>, LoadError> {
    let features = document
        .get("features")
        .and_then(JsonValue::as_array)
        .ok_or(LoadError::MissingFeatures)?;

    Ok(features.iter().map(feature_from_json).collect())
}

fn feature_from_json(value: &JsonValue) -> GeoFeature {
    let properties = value
        .get("properties")
        .and_then(JsonValue::as_object)
        .cloned()
        .unwrap_or_default();

    let name = resolve_alias(&properties, &NAME_KEYS).unwrap_or(UNKNOWN_NAME).to_string();
    let code = resolve_alias(&properties, &CODE_KEYS).unwrap_or_default().to_string();

    let geometry = match value.get("geometry") {
        None | Some(JsonValue::Null) => FeatureGeometry::Missing,
        Some(raw) => match Geometry::from_json_value(raw.clone()) {
            Ok(geometry) => classify(geometry.value),
            Err(e) => {
                warn!("skipping malformed geometry of {:?}: {}", name, e);
                FeatureGeometry::Missing
            }
        },
    };

    GeoFeature {
        name,
        code,
        properties,
        geometry,
    }
}

/// First alias key holding a non-empty string wins
pub fn resolve_alias<'a>(properties: &'a JsonObject<String, JsonValue>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| properties.get(*key))
        .filter_map(JsonValue::as_str)
        .find(|s| !s.is_empty())
}

fn classify(value: Value) -> FeatureGeometry {
    match value {
        Value::Polygon(rings) => FeatureGeometry::Polygon(rings),
        Value::MultiPolygon(polygons) => FeatureGeometry::MultiPolygon(polygons),
        Value::Point(_) => FeatureGeometry::Unsupported("Point"),
        Value::MultiPoint(_) => FeatureGeometry::Unsupported("MultiPoint"),
        Value::LineString(_) => FeatureGeometry::Unsupported("LineString"),
        Value::MultiLineString(_) => FeatureGeometry::Unsupported("MultiLineString"),
        Value::GeometryCollection(_) => FeatureGeometry::Unsupported("GeometryCollection"),
    }
}

/// Load features and build the globe and flat sets side by side
pub fn load_sets(path: &Path, radius: f64, interactive: bool) -> Result<LoadedSets, LoadError> {
    let document = load_document(path)?;
    let features = features_from_json(&document)?;
    debug!("{} features in {}", features.len(), path.display());

    let (globe, flat) = rayon::join(
        || assemble(&features, radius, ProjectionMode::Spherical, interactive),
        || assemble(&features, radius, ProjectionMode::Flat, interactive),
    );
    Ok(LoadedSets { globe, flat })
}

/// Load on a worker thread; the receiver yields exactly one result
pub fn spawn_loader(path: PathBuf, radius: f64, interactive: bool) -> Receiver<Result<LoadedSets, LoadError>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver may be gone if the app quit before loading finished
        let _ = tx.send(load_sets(&path, radius, interactive));
    });
    rx
}
