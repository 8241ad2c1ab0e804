use std::collections::HashMap;

use log::{debug, error, info, trace, warn};
use ratatui::style::Color;
use rayon::prelude::*;
use serde_json::{Map as JsonObject, Value as JsonValue};

use crate::data::{features_from_json, FeatureGeometry, GeoFeature};
use crate::map::projection::ProjectionMode;
use crate::map::ring::{build_ring, Outline, Surface};

/// Index of a `CountryGroup` inside its `PrimitiveSet`
pub type GroupId = usize;
/// Index of a `Primitive` inside its `PrimitiveSet`
pub type PrimitiveId = usize;

/// Tint every country outline starts with
pub const DEFAULT_COUNTRY_COLOR: Color = Color::Rgb(0x80, 0xFF, 0x80);

#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveKind {
    Outline(Outline),
    Surface(Surface),
}

/// One renderable or hit-testable piece of a country
#[derive(Clone, Debug, PartialEq)]
pub struct Primitive {
    /// Back-reference to the owning group
    pub owner: GroupId,
    pub color: Color,
    pub kind: PrimitiveKind,
}

impl Primitive {
    /// Surfaces are never drawn
    pub fn is_visible(&self) -> bool {
        matches!(self.kind, PrimitiveKind::Outline(_))
    }
}

/// All primitives of one feature under one projection mode
#[derive(Clone, Debug, PartialEq)]
pub struct CountryGroup {
    pub id: GroupId,
    pub name: String,
    pub code: String,
    pub properties: JsonObject<String, JsonValue>,
    pub primitives: Vec<PrimitiveId>,
}

/// Every country group built for one projection mode, plus the name lookup.
///
/// Groups and primitives live in flat arenas; primitives point back at their
/// owner by `GroupId`.
#[derive(Clone, Debug)]
pub struct PrimitiveSet {
    pub mode: ProjectionMode,
    groups: Vec<CountryGroup>,
    primitives: Vec<Primitive>,
    index: HashMap<String, GroupId>,
}

impl PrimitiveSet {
    pub fn empty(mode: ProjectionMode) -> Self {
        Self {
            mode,
            groups: Vec::new(),
            primitives: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Look up a country by name
    pub fn get(&self, name: &str) -> Option<&CountryGroup> {
        self.index.get(name).and_then(|&id| self.groups.get(id))
    }

    /// Group id currently indexed under `name`
    pub fn id_of(&self, name: &str) -> Option<GroupId> {
        self.index.get(name).copied()
    }

    pub fn group(&self, id: GroupId) -> Option<&CountryGroup> {
        self.groups.get(id)
    }

    pub fn groups(&self) -> &[CountryGroup] {
        &self.groups
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get(id)
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Hit-testable surfaces with their primitive ids
    pub fn surfaces(&self) -> impl Iterator<Item = (PrimitiveId, &Surface)> + '_ {
        self.primitives.iter().enumerate().filter_map(|(id, p)| match &p.kind {
            PrimitiveKind::Surface(surface) => Some((id, surface)),
            PrimitiveKind::Outline(_) => None,
        })
    }

    /// Primitives of a group, resolved
    pub fn group_primitives(&self, id: GroupId) -> impl Iterator<Item = &Primitive> + '_ {
        self.groups
            .get(id)
            .into_iter()
            .flat_map(|g| g.primitives.iter())
            .filter_map(|&pid| self.primitives.get(pid))
    }

    /// Repaint the visible primitives of a group. Returns false for unknown ids.
    pub fn set_group_color(&mut self, id: GroupId, color: Color) -> bool {
        let Some(group) = self.groups.get(id) else {
            return false;
        };
        for &pid in &group.primitives {
            if let Some(p) = self.primitives.get_mut(pid) {
                if p.is_visible() {
                    p.color = color;
                }
            }
        }
        true
    }

    /// Number of indexed country names
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Indexed country names (unordered)
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.index.keys().map(String::as_str)
    }

    /// Add a country group and index it by name.
    ///
    /// Groups without primitives are dropped. A name already in the index is
    /// overwritten; the earlier group stays in the arena.
    pub fn insert_group(
        &mut self,
        name: String,
        code: String,
        properties: JsonObject<String, JsonValue>,
        primitives: Vec<PrimitiveKind>,
    ) -> Option<GroupId> {
        if primitives.is_empty() {
            trace!("feature {:?} produced no primitives", name);
            return None;
        }

        let id = self.groups.len();
        let mut primitive_ids = Vec::with_capacity(primitives.len());
        for kind in primitives {
            primitive_ids.push(self.primitives.len());
            self.primitives.push(Primitive {
                owner: id,
                color: DEFAULT_COUNTRY_COLOR,
                kind,
            });
        }

        if let Some(previous) = self.index.insert(name.clone(), id) {
            warn!(
                "duplicate country name {:?}: group {} replaces group {} in the {:?} index",
                name, id, previous, self.mode
            );
        }

        self.groups.push(CountryGroup {
            id,
            name,
            code,
            properties,
            primitives: primitive_ids,
        });
        Some(id)
    }
}

/// A group built off-arena, before ids are assigned
struct PendingGroup {
    name: String,
    code: String,
    properties: JsonObject<String, JsonValue>,
    primitives: Vec<PrimitiveKind>,
}

/// Build one primitive set from already-parsed features.
///
/// Rings are projected in parallel; groups are inserted in input order so the
/// last feature with a given name owns the index entry.
pub fn assemble(features: &[GeoFeature], radius: f64, mode: ProjectionMode, interactive: bool) -> PrimitiveSet {
    let pending: Vec<PendingGroup> = features
        .par_iter()
        .filter_map(|feature| build_group(feature, radius, mode, interactive))
        .collect();

    let mut set = PrimitiveSet::empty(mode);
    for group in pending {
        set.insert_group(group.name, group.code, group.properties, group.primitives);
    }

    info!(
        "assembled {} {:?} country groups ({} primitives) from {} features",
        set.groups.len(),
        mode,
        set.primitives.len(),
        features.len()
    );
    set
}

/// Build one primitive set from a raw GeoJSON document.
/// A document without a `features` array yields an empty set.
pub fn assemble_json(document: &JsonValue, radius: f64, mode: ProjectionMode, interactive: bool) -> PrimitiveSet {
    match features_from_json(document) {
        Ok(features) => assemble(&features, radius, mode, interactive),
        Err(e) => {
            error!("invalid GeoJSON data: {}", e);
            PrimitiveSet::empty(mode)
        }
    }
}

fn build_group(feature: &GeoFeature, radius: f64, mode: ProjectionMode, interactive: bool) -> Option<PendingGroup> {
    let polygons: Vec<&Vec<Vec<Vec<f64>>>> = match &feature.geometry {
        FeatureGeometry::Polygon(rings) => vec![rings],
        FeatureGeometry::MultiPolygon(polygons) => polygons.iter().collect(),
        FeatureGeometry::Unsupported(kind) => {
            trace!("ignoring {} geometry of {:?}", kind, feature.name);
            return None;
        }
        FeatureGeometry::Missing => {
            debug!("feature {:?} has no geometry", feature.name);
            return None;
        }
    };

    let mut primitives = Vec::new();
    for rings in polygons {
        for ring in rings {
            let built = build_ring(ring, radius, mode, interactive);
            if let Some(outline) = built.outline {
                primitives.push(PrimitiveKind::Outline(outline));
            }
            if let Some(surface) = built.surface {
                primitives.push(PrimitiveKind::Surface(surface));
            }
        }
    }

    Some(PendingGroup {
        name: feature.name.clone(),
        code: feature.code.clone(),
        properties: feature.properties.clone(),
        primitives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(lon: f64, lat: f64, size: f64) -> JsonValue {
        json!([[
            [lon, lat],
            [lon + size, lat],
            [lon + size, lat + size],
            [lon, lat + size],
            [lon, lat]
        ]])
    }

    fn collection(features: Vec<JsonValue>) -> JsonValue {
        json!({ "type": "FeatureCollection", "features": features })
    }

    #[test]
    fn test_missing_features_yields_empty_set() {
        let set = assemble_json(&json!({ "type": "FeatureCollection" }), 2.0, ProjectionMode::Spherical, true);
        assert!(set.is_empty());
        assert!(set.primitives().is_empty());
    }

    #[test]
    fn test_polygon_feature_indexed_by_name() {
        let doc = collection(vec![json!({
            "type": "Feature",
            "properties": { "NAME": "X", "ISO_A3": "XXX", "POP_EST": 12 },
            "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 5.0) }
        })]);
        let set = assemble_json(&doc, 2.0, ProjectionMode::Spherical, true);

        let group = set.get("X").expect("group");
        assert_eq!(group.code, "XXX");
        assert_eq!(group.properties.get("POP_EST"), Some(&json!(12)));
        let kinds: Vec<bool> = set.group_primitives(group.id).map(Primitive::is_visible).collect();
        assert_eq!(kinds, vec![true, false]);
        assert!(set.group_primitives(group.id).all(|p| p.owner == group.id));
    }

    #[test]
    fn test_multipolygon_is_one_identity() {
        let polygons = vec![square(0.0, 0.0, 2.0), square(10.0, 10.0, 2.0), square(-20.0, 5.0, 1.0)];
        let doc = collection(vec![json!({
            "type": "Feature",
            "properties": { "name": "Archipelago" },
            "geometry": { "type": "MultiPolygon", "coordinates": polygons }
        })]);
        let set = assemble_json(&doc, 2.0, ProjectionMode::Flat, false);

        assert_eq!(set.len(), 1);
        let group = set.get("Archipelago").expect("group");
        assert_eq!(group.primitives.len(), 3);
        assert_eq!(group.code, "");
    }

    #[test]
    fn test_unsupported_and_empty_features_skipped() {
        let doc = collection(vec![
            json!({
                "type": "Feature",
                "properties": { "NAME": "Point" },
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }
            }),
            json!({
                "type": "Feature",
                "properties": { "NAME": "Empty" },
                "geometry": { "type": "Polygon", "coordinates": [[[1.0, 2.0]]] }
            }),
            json!({
                "type": "Feature",
                "properties": { "NAME": "Nothing" },
                "geometry": null
            }),
        ]);
        let set = assemble_json(&doc, 2.0, ProjectionMode::Spherical, true);
        assert!(set.is_empty());
        assert!(set.groups().is_empty());
    }

    #[test]
    fn test_duplicate_name_last_wins() {
        let doc = collection(vec![
            json!({
                "type": "Feature",
                "properties": { "NAME": "Testland", "ISO_A3": "AAA" },
                "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 1.0) }
            }),
            json!({
                "type": "Feature",
                "properties": { "NAME": "Testland", "ISO_A3": "BBB" },
                "geometry": { "type": "Polygon", "coordinates": square(30.0, 0.0, 1.0) }
            }),
        ]);
        let set = assemble_json(&doc, 2.0, ProjectionMode::Flat, true);

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("Testland").map(|g| g.code.as_str()), Some("BBB"));
        assert_eq!(set.id_of("Testland"), Some(1));
        // The shadowed group is still drawn
        assert_eq!(set.groups().len(), 2);
    }

    #[test]
    fn test_modes_share_key_set() {
        let doc = collection(vec![
            json!({
                "type": "Feature",
                "properties": { "NAME": "A" },
                "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 3.0) }
            }),
            json!({
                "type": "Feature",
                "properties": { "name": "B" },
                "geometry": { "type": "Polygon", "coordinates": square(40.0, -10.0, 3.0) }
            }),
        ]);
        let globe = assemble_json(&doc, 2.0, ProjectionMode::Spherical, true);
        let flat = assemble_json(&doc, 2.0, ProjectionMode::Flat, true);

        let mut a: Vec<&str> = globe.names().collect();
        let mut b: Vec<&str> = flat.names().collect();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, vec!["A", "B"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_group_color_skips_surfaces() {
        let doc = collection(vec![json!({
            "type": "Feature",
            "properties": { "NAME": "X" },
            "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 5.0) }
        })]);
        let mut set = assemble_json(&doc, 2.0, ProjectionMode::Flat, true);

        assert!(set.set_group_color(0, Color::Red));
        for p in set.group_primitives(0) {
            let expected = if p.is_visible() { Color::Red } else { DEFAULT_COUNTRY_COLOR };
            assert_eq!(p.color, expected);
        }
        assert!(!set.set_group_color(9, Color::Red));
    }
}
