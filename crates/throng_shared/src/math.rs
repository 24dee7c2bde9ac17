//! Column-major matrix helpers.
//!
//! Matrices are stored as `m[column][row]`, the layout WGSL `mat4x4<f32>`
//! expects, so they can be uploaded with `bytemuck` without transposing.

/// 4x4 column-major matrix.
pub type Mat4 = [[f32; 4]; 4];

/// Identity matrix.
pub const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Component-wise `a - b`.
#[must_use]
pub fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Cross product.
#[must_use]
pub fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Dot product.
#[must_use]
pub fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Euclidean length.
#[must_use]
pub fn length(v: [f32; 3]) -> f32 {
    dot(v, v).sqrt()
}

/// Unit vector in the direction of `v`, or zero for a zero-length input.
#[must_use]
pub fn normalize(v: [f32; 3]) -> [f32; 3] {
    let l = length(v);
    if l > 0.0001 {
        [v[0] / l, v[1] / l, v[2] / l]
    } else {
        [0.0, 0.0, 0.0]
    }
}

/// Returns `a * b`.
#[must_use]
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut result = [[0.0; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            for k in 0..4 {
                result[col][row] += a[k][row] * b[col][k];
            }
        }
    }
    result
}

/// Extracts row `r` of a column-major matrix.
#[must_use]
pub fn row(m: &Mat4, r: usize) -> [f32; 4] {
    [m[0][r], m[1][r], m[2][r], m[3][r]]
}

/// Transforms a point (w = 1) and drops the w component.
#[must_use]
pub fn transform_point(m: &Mat4, p: [f32; 3]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (i, o) in out.iter_mut().enumerate() {
        *o = m[0][i] * p[0] + m[1][i] * p[1] + m[2][i] * p[2] + m[3][i];
    }
    out
}

/// Translation matrix.
#[must_use]
pub fn translation(t: [f32; 3]) -> Mat4 {
    let mut m = IDENTITY;
    m[3] = [t[0], t[1], t[2], 1.0];
    m
}

/// Rotation about +Y by `angle` radians.
#[must_use]
pub fn rotation_y(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    [
        [c, 0.0, -s, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [s, 0.0, c, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Non-uniform scale matrix.
#[must_use]
pub fn scale(s: [f32; 3]) -> Mat4 {
    [
        [s[0], 0.0, 0.0, 0.0],
        [0.0, s[1], 0.0, 0.0],
        [0.0, 0.0, s[2], 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Translate * `RotateY` * Scale.
#[must_use]
pub fn trs(position: [f32; 3], yaw: f32, s: [f32; 3]) -> Mat4 {
    multiply(&multiply(&translation(position), &rotation_y(yaw)), &scale(s))
}

/// Right-handed view matrix looking from `eye` at `target`.
#[must_use]
pub fn look_at(eye: [f32; 3], target: [f32; 3], up: [f32; 3]) -> Mat4 {
    let f = normalize(sub(target, eye));
    let r = normalize(cross(f, up));
    let u = cross(r, f);
    [
        [r[0], u[0], -f[0], 0.0],
        [r[1], u[1], -f[1], 0.0],
        [r[2], u[2], -f[2], 0.0],
        [-dot(r, eye), -dot(u, eye), dot(f, eye), 1.0],
    ]
}

/// Right-handed perspective projection with a 0..1 depth range (wgpu clip space).
#[must_use]
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();
    let a = far / (near - far);
    let b = (near * far) / (near - far);
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, a, -1.0],
        [0.0, 0.0, b, 0.0],
    ]
}

/// Right-handed perspective projection with a -1..1 depth range (OpenGL clip space).
#[must_use]
pub fn perspective_gl(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y / 2.0).tan();
    let a = (far + near) / (near - far);
    let b = (2.0 * far * near) / (near - far);
    [
        [f / aspect, 0.0, 0.0, 0.0],
        [0.0, f, 0.0, 0.0],
        [0.0, 0.0, a, -1.0],
        [0.0, 0.0, b, 0.0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < 1e-4)
    }

    #[test]
    fn test_identity_multiply() {
        let m = trs([1.0, 2.0, 3.0], 0.3, [2.0, 1.0, 0.5]);
        assert_eq!(multiply(&IDENTITY, &m), m);
        assert_eq!(multiply(&m, &IDENTITY), m);
    }

    #[test]
    fn test_trs_applies_scale_then_rotation_then_translation() {
        let m = trs([10.0, 0.0, 0.0], std::f32::consts::FRAC_PI_2, [2.0, 2.0, 2.0]);
        // +X scaled to 2, rotated a quarter turn about Y onto -Z, moved by +10 X.
        let p = transform_point(&m, [1.0, 0.0, 0.0]);
        assert!(approx(p, [10.0, 0.0, -2.0]), "got {p:?}");
    }

    #[test]
    fn test_look_at_puts_target_on_negative_z() {
        let view = look_at([0.0, 0.0, 10.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let p = transform_point(&view, [0.0, 0.0, 0.0]);
        assert!(approx(p, [0.0, 0.0, -10.0]), "got {p:?}");
    }

    #[test]
    fn test_perspective_depth_ranges() {
        let (n, f) = (0.1, 100.0);
        let zero_one = perspective(1.0, 1.0, n, f);
        let gl = perspective_gl(1.0, 1.0, n, f);

        let ndc_z = |m: &Mat4, z: f32| {
            let clip_z = m[2][2] * z + m[3][2];
            let clip_w = m[2][3] * z + m[3][3];
            clip_z / clip_w
        };

        assert!(ndc_z(&zero_one, -n).abs() < 1e-4);
        assert!((ndc_z(&zero_one, -f) - 1.0).abs() < 1e-4);
        assert!((ndc_z(&gl, -n) + 1.0).abs() < 1e-4);
        assert!((ndc_z(&gl, -f) - 1.0).abs() < 1e-3);
    }
}
