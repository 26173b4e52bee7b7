//! Frame frustum bounds and default camera framing
//!
//! A [`FrameFrustum`] is the near-plane rectangle plus clip distances that
//! both `Rasterizer::frustum_matrix` and `Rasterizer::ortho_matrix` consume.

/// Which sensor dimension drives the field of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorFit {
    /// Larger frame dimension follows the sensor width
    #[default]
    Auto,
    /// Frame width follows the sensor width
    Horizontal,
    /// Frame height follows the sensor height
    Vertical,
}

/// Near-plane rectangle and clip distances
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameFrustum {
    /// Left
    pub x1: f32,
    /// Right
    pub x2: f32,
    /// Bottom
    pub y1: f32,
    /// Top
    pub y2: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
}

impl FrameFrustum {
    /// Frustum from explicit bounds
    pub fn new(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self { x1: left, x2: right, y1: bottom, y2: top, near, far }
    }

    fn fitted(half_size: f32, sensor_fit: SensorFit, aspect_ratio: f32, near: f32, far: f32, shift_x: f32, shift_y: f32) -> Self {
        let (size_x, size_y) = match sensor_fit {
            SensorFit::Auto if aspect_ratio > 1.0 => (half_size, half_size / aspect_ratio),
            SensorFit::Auto => (half_size * aspect_ratio, half_size),
            SensorFit::Horizontal => (half_size, half_size / aspect_ratio),
            SensorFit::Vertical => (half_size * aspect_ratio, half_size),
        };

        let offset = 2.0 * half_size;
        Self {
            x1: -size_x + shift_x * offset,
            x2: size_x + shift_x * offset,
            y1: -size_y + shift_y * offset,
            y2: size_y + shift_y * offset,
            near,
            far,
        }
    }
}

/// Perspective framing from lens and sensor settings
///
/// `lens` and the sensor sizes are in millimetres; the result is in scene
/// units on the near plane.
pub fn compute_default_frustum(
    near: f32,
    far: f32,
    lens: f32,
    sensor_x: f32,
    sensor_y: f32,
    sensor_fit: SensorFit,
    shift_x: f32,
    shift_y: f32,
    aspect_ratio: f32,
) -> FrameFrustum {
    let sensor = match sensor_fit {
        SensorFit::Vertical => sensor_y,
        SensorFit::Auto | SensorFit::Horizontal => sensor_x,
    };
    let half_size = (sensor / 2.0) * near / lens;
    FrameFrustum::fitted(half_size, sensor_fit, aspect_ratio, near, far, shift_x, shift_y)
}

/// Orthographic framing from the camera's ortho scale
pub fn compute_default_ortho(
    near: f32,
    far: f32,
    scale: f32,
    aspect_ratio: f32,
    sensor_fit: SensorFit,
    shift_x: f32,
    shift_y: f32,
) -> FrameFrustum {
    let half_size = scale * 0.5;
    FrameFrustum::fitted(half_size, sensor_fit, aspect_ratio, near, far, shift_x, shift_y)
}
