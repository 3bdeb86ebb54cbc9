use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

const FOV_Y_DEGREES: f32 = 60.0;
const NEAR: f32 = 1.0;
const FAR: f32 = 20000.0;
const MIN_DISTANCE: f32 = 1.0;

/// Orbit camera pose: look at `center` from `distance` away, rotated by
/// `rotation`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub distance: f32,
    pub center: Vec3,
    pub rotation: Quat,
}

impl CameraState {
    /// Builds a state from a `[w, x, y, z]` rotation. A zero rotation becomes
    /// the identity; anything else is normalized.
    pub fn new(distance: f32, center: Vec3, rotation: [f32; 4]) -> Self {
        let [w, x, y, z] = rotation;
        let rotation = Quat::from_xyzw(x, y, z, w);
        let rotation = if rotation.length_squared() > f32::EPSILON {
            rotation.normalize()
        } else {
            Quat::IDENTITY
        };
        Self {
            distance,
            center,
            rotation,
        }
    }

    /// Wide shot the demo starts from.
    pub fn overview() -> Self {
        Self::new(2000.0, Vec3::ZERO, [1.0, 1.0, 0.0, 0.0])
    }

    /// Close-up the demo settles on and returns to on reset.
    pub fn close_up() -> Self {
        Self::new(
            400.0,
            Vec3::new(0.0, 0.0, 60.0),
            [0.81146751, 0.5188172, 0.127647, -0.2367598],
        )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_quat(self.rotation)
            * Mat4::from_translation(-self.center)
    }
}

/// Camera controller. State changes apply immediately.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    state: CameraState,
    reset_state: CameraState,
    viewport: (u32, u32),
}

impl OrbitCamera {
    pub fn new(state: CameraState, viewport: (u32, u32)) -> Self {
        Self {
            state,
            reset_state: state,
            viewport: (viewport.0.max(1), viewport.1.max(1)),
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn set_state(&mut self, state: CameraState) {
        self.state = state;
    }

    pub fn set_reset_state(&mut self, state: CameraState) {
        self.reset_state = state;
    }

    pub fn reset(&mut self) {
        self.state = self.reset_state;
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.0 as f32 / self.viewport.1 as f32
    }

    /// Rotates around the center; `dx`/`dy` are in radians.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        let delta = Quat::from_rotation_y(dx) * Quat::from_rotation_x(dy);
        self.state.rotation = (delta * self.state.rotation).normalize();
    }

    /// Scales the distance by `factor`, never closer than one unit.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.state.distance = (self.state.distance * factor).max(MIN_DISTANCE);
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.state.view_matrix()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(FOV_Y_DEGREES.to_radians(), self.aspect(), NEAR, FAR)
    }
}
