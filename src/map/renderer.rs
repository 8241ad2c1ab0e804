use glam::DVec3;
use ratatui::style::Color;

use crate::braille::BrailleCanvas;
use crate::map::assembly::{PrimitiveKind, PrimitiveSet};
use crate::map::camera::{Camera, Viewport};
use crate::map::geometry::draw_segment;
use crate::map::scene::{Fog, Scene};

/// Segments fogged below this visibility are not drawn
const FOG_CUTOFF: f64 = 0.12;
/// Segments fogged below this visibility are drawn dimmed
const FOG_DIM: f64 = 0.3;

/// Braille layers, composited back to front by the UI
pub struct MapLayers {
    pub stars: BrailleCanvas,
    pub graticule: BrailleCanvas,
    /// Outlines too deep in the fog for their own color
    pub dimmed: BrailleCanvas,
    /// Country outlines grouped by tint, in first-seen order
    pub countries: Vec<(Color, BrailleCanvas)>,
}

impl MapLayers {
    fn new(cols: usize, rows: usize) -> Self {
        Self {
            stars: BrailleCanvas::new(cols, rows),
            graticule: BrailleCanvas::new(cols, rows),
            dimmed: BrailleCanvas::new(cols, rows),
            countries: Vec::new(),
        }
    }

    fn country_layer(&mut self, color: Color, cols: usize, rows: usize) -> &mut BrailleCanvas {
        let idx = match self.countries.iter().position(|(c, _)| *c == color) {
            Some(idx) => idx,
            None => {
                self.countries.push((color, BrailleCanvas::new(cols, rows)));
                self.countries.len() - 1
            }
        };
        &mut self.countries[idx].1
    }
}

/// Draws the visible parts of a scene through a camera
pub struct MapRenderer<'a> {
    camera: &'a Camera,
    viewport: Viewport,
    cols: usize,
    rows: usize,
}

impl<'a> MapRenderer<'a> {
    /// Renderer for a `cols` x `rows` character area
    pub fn new(camera: &'a Camera, cols: usize, rows: usize) -> Self {
        Self {
            camera,
            viewport: Viewport::new(cols * 2, rows * 4),
            cols,
            rows,
        }
    }

    /// Render every visible group of the scene
    pub fn render(&self, scene: &Scene) -> MapLayers {
        let mut layers = MapLayers::new(self.cols, self.rows);

        if scene.stars_visible {
            for star in &scene.stars.points {
                // Stars ignore fog
                if let Some((x, y, _)) = self.to_dots(*star) {
                    layers.stars.set_dot_signed(x, y);
                }
            }
        }

        if scene.globe_visible {
            for line in &scene.graticule {
                self.draw_polyline(&line.points, scene.fog, |_, a, b| draw_segment(&mut layers.graticule, a, b));
            }
            self.draw_set(&scene.globe, scene.fog, &mut layers);
        }

        // Fog belongs to the globe; the flat map is always drawn clear
        if scene.flat_visible {
            self.draw_set(&scene.flat, None, &mut layers);
        }

        layers
    }

    fn draw_set(&self, set: &PrimitiveSet, fog: Option<Fog>, layers: &mut MapLayers) {
        let (cols, rows) = (self.cols, self.rows);
        for primitive in set.primitives() {
            let PrimitiveKind::Outline(outline) = &primitive.kind else {
                continue;
            };
            let color = primitive.color;
            self.draw_polyline(&outline.points, fog, |visibility, a, b| {
                let canvas = if visibility < FOG_DIM {
                    &mut layers.dimmed
                } else {
                    layers.country_layer(color, cols, rows)
                };
                draw_segment(canvas, a, b);
            });
        }
    }

    /// Walk a line strip, handing each unfogged projected segment and its fog
    /// visibility to `draw`.
    fn draw_polyline<F>(&self, points: &[DVec3], fog: Option<Fog>, mut draw: F)
    where
        F: FnMut(f64, (i32, i32), (i32, i32)),
    {
        if points.len() < 2 {
            return;
        }

        let mut prev: Option<(i32, i32, f64)> = None;
        for p in points {
            let current = self.to_dots(*p);
            if let (Some((x0, y0, d0)), Some((x1, y1, d1))) = (prev, current) {
                let visibility = fog.map_or(1.0, |fog| fog.visibility(d0.max(d1)));
                if visibility >= FOG_CUTOFF {
                    draw(visibility, (x0, y0), (x1, y1));
                }
            }
            prev = current;
        }
    }

    /// World point to dot coordinates plus eye distance
    fn to_dots(&self, p: DVec3) -> Option<(i32, i32, f64)> {
        let (ndc, distance) = self.camera.world_to_ndc(p)?;
        let dots = self.viewport.from_ndc(ndc);
        if !dots.is_finite() {
            return None;
        }
        Some((dots.x.floor() as i32, dots.y.floor() as i32, distance))
    }
}
