//! Projection and transform matrices, column-major like WGSL expects.

use glam::{Mat4, Vec3};

use super::dimensions::SurfaceDimensions;

/// Orthographic projection of the box [left, right] x [bottom, top] x [near, far]
/// onto the [-1, 1] clip cube
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    Mat4::from_cols_array(&[
        2.0 / (right - left),
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 / (top - bottom),
        0.0,
        0.0,
        0.0,
        0.0,
        2.0 / (near - far),
        0.0,
        (left + right) / (left - right),
        (bottom + top) / (bottom - top),
        (near + far) / (near - far),
        1.0,
    ])
}

/// Pixel-space projection: y = 0 is the top edge
pub fn projection(width: f32, height: f32) -> Mat4 {
    orthographic(0.0, width, height, 0.0, -1.0, 1.0)
}

/// Right-multiply a 2D translation. Only the fourth column changes.
pub fn translate(m: Mat4, tx: f32, ty: f32) -> Mat4 {
    m * Mat4::from_translation(Vec3::new(tx, ty, 0.0))
}

/// Scale the first two basis vectors. The translation column is untouched.
pub fn scale(m: Mat4, sx: f32, sy: f32) -> Mat4 {
    m * Mat4::from_scale(Vec3::new(sx, sy, 1.0))
}

/// Maps the unit quad onto the whole surface, in that exact order:
/// projection, then translate, then scale
pub fn surface_transform(dims: SurfaceDimensions) -> Mat4 {
    let (w, h) = (dims.width as f32, dims.height as f32);
    let m = projection(w, h);
    let m = translate(m, 0.0, 0.0);
    scale(m, w, h)
}
