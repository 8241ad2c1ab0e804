mod assembly;
mod camera;
mod geometry;
mod picking;
mod projection;
mod renderer;
mod ring;
mod scene;
mod selection;

pub use assembly::{
    assemble, assemble_json, CountryGroup, GroupId, Primitive, PrimitiveId, PrimitiveKind, PrimitiveSet,
    DEFAULT_COUNTRY_COLOR,
};
pub use camera::{Camera, Ray, Viewport};
pub use picking::{nearest_hit, pick, Hit};
pub use projection::{project, ProjectionMode, FLAT_SCALE_DIVISOR};
pub use renderer::{MapLayers, MapRenderer};
pub use ring::{build_ring, Aabb, BuiltRing, Outline, Surface};
pub use scene::{Fog, Scene, Starfield, GLOBE_FOG_DENSITY, GRATICULE_STEP, REFERENCE_RADIUS};
pub use selection::{CountrySelected, JsonLineNotifier, SelectionController, SelectionListener, HIGHLIGHT_COLOR};
