use glam::{Mat4, Vec3};
use log::warn;

/// Model-view matrix with push/pop scopes.
///
/// Local transforms post-multiply the current matrix, so the last transform
/// applied is the first one seen by geometry placed afterwards.
#[derive(Debug, Clone)]
pub struct MatrixStack {
    current: Mat4,
    saved: Vec<Mat4>,
}

impl Default for MatrixStack {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

impl MatrixStack {
    /// Starts a stack from the camera's view matrix.
    pub fn new(view: Mat4) -> Self {
        Self {
            current: view,
            saved: Vec::new(),
        }
    }

    pub fn current(&self) -> Mat4 {
        self.current
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn push(&mut self) {
        self.saved.push(self.current);
    }

    /// Restores the matrix saved by the matching [`MatrixStack::push`].
    pub fn pop(&mut self) {
        match self.saved.pop() {
            Some(matrix) => self.current = matrix,
            None => warn!("matrix stack pop without matching push"),
        }
    }

    /// Runs `body` inside a push/pop pair and returns its result.
    pub fn scoped<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        self.push();
        let result = body(self);
        self.pop();
        result
    }

    pub fn translate(&mut self, offset: Vec3) -> &mut Self {
        self.current *= Mat4::from_translation(offset);
        self
    }

    pub fn rotate_x(&mut self, angle: f32) -> &mut Self {
        self.current *= Mat4::from_rotation_x(angle);
        self
    }

    pub fn rotate_z(&mut self, angle: f32) -> &mut Self {
        self.current *= Mat4::from_rotation_z(angle);
        self
    }

    pub fn scale(&mut self, factors: Vec3) -> &mut Self {
        self.current *= Mat4::from_scale(factors);
        self
    }
}
