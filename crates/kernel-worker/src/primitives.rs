//! `createPrimitive` on the kernel side

use shared::{Primitive, Transform};
use vcad::{centered_cube, Part};

/// Subdivisions for curved primitives when the caller does not ask for any
pub const DEFAULT_SEGMENTS: u32 = 32;

/// Build the solid for `primitive` and place it with `transform`.
///
/// Scale is applied first, then rotation (degrees), then translation.
pub fn build_shape(id: &str, primitive: &Primitive, transform: &Transform, segments: u32) -> Part {
    let segments = segments.max(3);
    let part = match *primitive {
        Primitive::Cube {
            width,
            height,
            depth,
        } => centered_cube(id, width, height, depth),
        Primitive::Cylinder { radius, height } => Part::cylinder(id, radius, height, segments),
        Primitive::Sphere { radius } => Part::sphere(id, radius, segments),
        Primitive::Cone { radius, height } => Part::cone(id, radius, 0.0, height, segments),
    };

    if transform.is_identity() {
        return part;
    }
    place(part, transform)
}

fn place(part: Part, transform: &Transform) -> Part {
    let [sx, sy, sz] = transform.scale;
    let [rx, ry, rz] = transform.rotation;
    let [tx, ty, tz] = transform.position;

    let scaled = if [sx, sy, sz] == [1.0; 3] {
        part
    } else {
        part.scale(sx, sy, sz)
    };
    let rotated = if [rx, ry, rz] == [0.0; 3] {
        scaled
    } else {
        scaled.rotate(rx, ry, rz)
    };
    if [tx, ty, tz] == [0.0; 3] {
        rotated
    } else {
        rotated.translate(tx, ty, tz)
    }
}
