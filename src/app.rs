use std::sync::mpsc::{Receiver, TryRecvError};

use log::{error, info};
use ratatui::layout::{Position, Rect};

use crate::data::{LoadError, LoadedSets};
use crate::map::{
    pick, Camera, CountrySelected, Fog, PrimitiveSet, Scene, SelectionController, Viewport, REFERENCE_RADIUS,
};
use crate::ui::info_panel_area;

/// Camera distance from the origin on a globe of `REFERENCE_RADIUS`
pub const GLOBE_DISTANCE: f64 = 5.0;
/// Camera distance from the plane on the flat map, at `REFERENCE_RADIUS`
pub const FLAT_DISTANCE: f64 = 10.0;

/// Radians of orbit per character dragged
const ORBIT_STEP: f64 = 0.05;
const ZOOM_STEP: f64 = 1.1;

/// Which projection is on screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewMode {
    /// Spherical globe with stars and fog
    ThreeD,
    /// Flat equirectangular plane
    TwoD,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::ThreeD => ViewMode::TwoD,
            ViewMode::TwoD => ViewMode::ThreeD,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::ThreeD => "3D",
            ViewMode::TwoD => "2D",
        }
    }
}

/// Progress of the background GeoJSON load
#[derive(Clone, Debug, PartialEq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// Application state
pub struct App {
    pub mode: ViewMode,
    pub scene: Scene,
    pub camera: Camera,
    pub viewport: Viewport,
    pub selection: SelectionController,
    pub load_state: LoadState,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Set once the pointer moves while the button is held
    dragged: bool,
    loader: Option<Receiver<Result<LoadedSets, LoadError>>>,
}

impl App {
    /// Session for a `width` x `height` terminal, starting on the globe
    pub fn new(width: usize, height: usize, radius: f64, star_count: usize) -> Self {
        let viewport = map_viewport(width, height);
        let scale = radius / REFERENCE_RADIUS;
        Self {
            mode: ViewMode::ThreeD,
            scene: Scene::new(radius, star_count),
            camera: Camera::scaled(GLOBE_DISTANCE * scale, viewport.aspect(), scale),
            viewport,
            selection: SelectionController::new(),
            load_state: LoadState::Loading,
            should_quit: false,
            last_mouse: None,
            dragged: false,
            loader: None,
        }
    }

    /// Take ownership of a pending load; see [`crate::data::spawn_loader`]
    pub fn attach_loader(&mut self, loader: Receiver<Result<LoadedSets, LoadError>>) {
        self.load_state = LoadState::Loading;
        self.loader = Some(loader);
    }

    /// Install the loaded sets if the worker has finished. Called once per frame.
    pub fn poll_loader(&mut self) {
        let Some(loader) = &self.loader else {
            return;
        };
        match loader.try_recv() {
            Ok(Ok(sets)) => {
                info!("loaded {} countries", sets.globe.len());
                self.scene.install(sets.globe, sets.flat);
                self.load_state = LoadState::Ready;
                self.loader = None;
            }
            Ok(Err(e)) => {
                error!("failed to load country data: {}", e);
                self.load_state = LoadState::Failed(e.to_string());
                self.loader = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                error!("country loader exited without a result");
                self.load_state = LoadState::Failed("loader exited".to_string());
                self.loader = None;
            }
        }
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        self.viewport = map_viewport(width, height);
        self.camera.aspect = self.viewport.aspect();
    }

    /// Home camera distance for a mode, scaled with the globe radius
    pub fn home_distance(&self, mode: ViewMode) -> f64 {
        let scale = self.scene.radius / REFERENCE_RADIUS;
        match mode {
            ViewMode::ThreeD => GLOBE_DISTANCE * scale,
            ViewMode::TwoD => FLAT_DISTANCE * scale,
        }
    }

    /// Terminal cells of the map, inside its border
    pub fn map_area(&self) -> Rect {
        Rect::new(1, 1, (self.viewport.width / 2) as u16, (self.viewport.height / 4) as u16)
    }

    pub fn active_set(&self) -> &PrimitiveSet {
        match self.mode {
            ViewMode::ThreeD => &self.scene.globe,
            ViewMode::TwoD => &self.scene.flat,
        }
    }

    /// Switch between globe and flat map.
    ///
    /// The selection is cleared on the outgoing set first, so a highlight
    /// never survives into the other projection.
    pub fn toggle_mode(&mut self) {
        let outgoing = active_set_mut(&mut self.scene, self.mode);
        self.selection.clear(outgoing);

        self.mode = self.mode.toggled();
        let globe = self.mode == ViewMode::ThreeD;
        self.scene.globe_visible = globe;
        self.scene.flat_visible = !globe;
        self.scene.stars_visible = globe;
        self.scene.fog = globe.then(|| Fog::globe(self.scene.radius));
        self.camera.reset(self.home_distance(self.mode));
        info!("switched to {} view", self.mode.label());
    }

    /// Pick at a terminal cell, aiming at the centre of its Braille dots.
    /// Clicks on the info panel never reach the map.
    pub fn pick_at(&mut self, col: u16, row: u16) -> Option<CountrySelected> {
        if self.selection.panel().is_some()
            && info_panel_area(self.map_area()).is_some_and(|panel| panel.contains(Position::new(col, row)))
        {
            return None;
        }
        let (px, py) = cell_to_dots(col, row)?;
        self.pick_pointer(px, py)
    }

    /// Pick at a pointer position in viewport dots and select the hit country
    pub fn pick_pointer(&mut self, px: f64, py: f64) -> Option<CountrySelected> {
        let set = active_set_mut(&mut self.scene, self.mode);
        let group = pick(px, py, &self.viewport, &self.camera, set)?;
        self.selection.select(set, group).cloned()
    }

    pub fn clear_selection(&mut self) {
        let set = active_set_mut(&mut self.scene, self.mode);
        self.selection.clear(set);
    }

    /// Left button pressed
    pub fn mouse_down(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Orbit the globe or slide the flat map with the pointer
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = col as f64 - last_col as f64;
            let dy = row as f64 - last_row as f64;
            if dx != 0.0 || dy != 0.0 {
                self.dragged = true;
            }
            match self.mode {
                ViewMode::ThreeD => self.camera.orbit(-dx * ORBIT_STEP, dy * ORBIT_STEP),
                ViewMode::TwoD => {
                    // Characters to NDC: 2 dots wide, 4 dots tall, NDC spans 2
                    let w = self.viewport.width.max(1) as f64;
                    let h = self.viewport.height.max(1) as f64;
                    self.camera.pan(-dx * 4.0 / w, dy * 8.0 / h);
                }
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// Left button released; a press without movement is a click
    pub fn mouse_up(&mut self, col: u16, row: u16) -> Option<CountrySelected> {
        let clicked = self.last_mouse.is_some() && !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if clicked {
            self.pick_at(col, row)
        } else {
            None
        }
    }

    pub fn zoom_in(&mut self) {
        self.camera.zoom(1.0 / ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom(ZOOM_STEP);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Status bar hint for the toggle key
    pub fn toggle_hint(&self) -> &'static str {
        match self.mode {
            ViewMode::ThreeD => "[t] Switch to 2D",
            ViewMode::TwoD => "[t] Switch to 3D",
        }
    }

    /// Load progress for the status bar
    pub fn data_status(&self) -> String {
        match &self.load_state {
            LoadState::Loading => "loading...".to_string(),
            LoadState::Ready if self.active_set().is_empty() => "no data".to_string(),
            LoadState::Ready => format!("{} countries", self.active_set().len()),
            LoadState::Failed(_) => "no data".to_string(),
        }
    }
}

/// Braille dot area inside the map border and above the status bar
fn map_viewport(width: usize, height: usize) -> Viewport {
    let inner_width = width.saturating_sub(2);
    let inner_height = height.saturating_sub(3);
    Viewport::new(inner_width * 2, inner_height * 4)
}

/// Terminal cell to the dot centre of that cell, accounting for the border
fn cell_to_dots(col: u16, row: u16) -> Option<(f64, f64)> {
    if col == 0 || row == 0 {
        return None;
    }
    let px = (col - 1) as f64 * 2.0 + 1.0;
    let py = (row - 1) as f64 * 4.0 + 2.0;
    Some((px, py))
}

fn active_set_mut(scene: &mut Scene, mode: ViewMode) -> &mut PrimitiveSet {
    match mode {
        ViewMode::ThreeD => &mut scene.globe,
        ViewMode::TwoD => &mut scene.flat,
    }
}
