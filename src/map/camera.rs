use glam::{DVec2, DVec3};

/// Vertical field of view of the scene camera
pub const FOV_Y_DEGREES: f64 = 75.0;
pub const Z_NEAR: f64 = 1.0;
pub const Z_FAR: f64 = 100.0;

const MIN_DISTANCE: f64 = 2.5;
const MAX_DISTANCE: f64 = 40.0;
const PITCH_LIMIT: f64 = std::f64::consts::FRAC_PI_2 - 0.017;

/// Drawable area in Braille dots
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    /// Pointer position (dots, y down) to normalized device coordinates.
    /// `None` outside the viewport or for an empty viewport.
    pub fn to_ndc(&self, px: f64, py: f64) -> Option<DVec2> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let (w, h) = (self.width as f64, self.height as f64);
        if !(0.0..=w).contains(&px) || !(0.0..=h).contains(&py) {
            return None;
        }
        Some(DVec2::new(px / w * 2.0 - 1.0, -(py / h) * 2.0 + 1.0))
    }

    /// Normalized device coordinates back to dot coordinates
    pub fn from_ndc(&self, ndc: DVec2) -> DVec2 {
        DVec2::new(
            (ndc.x + 1.0) / 2.0 * self.width as f64,
            (1.0 - ndc.y) / 2.0 * self.height as f64,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit length
    pub dir: DVec3,
}

impl Ray {
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.dir * t
    }
}

/// Perspective camera orbiting a target point.
///
/// With zero yaw/pitch the eye sits on +Z at `distance` looking down -Z.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub target: DVec3,
    pub distance: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub fov_y: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

struct Basis {
    forward: DVec3,
    right: DVec3,
    up: DVec3,
}

impl Camera {
    pub fn new(distance: f64, aspect: f64) -> Self {
        Self::scaled(distance, aspect, 1.0)
    }

    /// Camera whose clip planes and zoom limits are stretched by `scale`,
    /// for a scene built larger or smaller than the default globe.
    pub fn scaled(distance: f64, aspect: f64, scale: f64) -> Self {
        Self {
            target: DVec3::ZERO,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            fov_y: FOV_Y_DEGREES.to_radians(),
            aspect,
            near: Z_NEAR * scale,
            far: Z_FAR * scale,
            min_distance: MIN_DISTANCE * scale,
            max_distance: MAX_DISTANCE * scale,
        }
    }

    pub fn eye(&self) -> DVec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + DVec3::new(sy * cp, sp, cy * cp) * self.distance
    }

    fn basis(&self) -> Basis {
        let forward = (self.target - self.eye()).normalize();
        let right = forward.cross(DVec3::Y).normalize();
        let up = right.cross(forward);
        Basis { forward, right, up }
    }

    /// Ray from the eye through a point in normalized device coordinates
    pub fn ray(&self, ndc: DVec2) -> Ray {
        let b = self.basis();
        let tan_half = (self.fov_y / 2.0).tan();
        let dir = b.forward + b.right * (ndc.x * tan_half * self.aspect) + b.up * (ndc.y * tan_half);
        Ray {
            origin: self.eye(),
            dir: dir.normalize(),
        }
    }

    /// Project a world point to normalized device coordinates plus its
    /// distance from the eye. `None` outside the near/far range.
    pub fn world_to_ndc(&self, p: DVec3) -> Option<(DVec2, f64)> {
        let b = self.basis();
        let eye = self.eye();
        let v = p - eye;
        let depth = v.dot(b.forward);
        if depth < self.near || depth > self.far {
            return None;
        }
        let tan_half = (self.fov_y / 2.0).tan();
        let ndc = DVec2::new(
            v.dot(b.right) / (depth * tan_half * self.aspect),
            v.dot(b.up) / (depth * tan_half),
        );
        Some((ndc, v.length()))
    }

    /// Rotate around the target
    pub fn orbit(&mut self, d_yaw: f64, d_pitch: f64) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Slide the target in the view plane by NDC-scaled amounts
    pub fn pan(&mut self, dx: f64, dy: f64) {
        let b = self.basis();
        let tan_half = (self.fov_y / 2.0).tan();
        let scale = self.distance * tan_half;
        self.target += b.right * (dx * scale * self.aspect) + b.up * (dy * scale);
    }

    /// Scale the eye distance
    pub fn zoom(&mut self, factor: f64) {
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Drop orbit and pan state, keeping the projection parameters
    pub fn reset(&mut self, distance: f64) {
        self.target = DVec3::ZERO;
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.distance = distance;
    }
}
