use std::f64::consts::SQRT_2;

use crate::complex::Complex;
use crate::error::CoreError;

/// Plane units covered by the shorter grid dimension at zoom 1.
pub const PLANE_SPAN: f64 = 2.5;

/// Side length in pixels of the square neighbourhood cache.
pub const NEIGHBORHOOD_RES: u32 = 128;

/// How much wider (in plane units) the neighbourhood cache reaches than the
/// viewport's unit span at the same zoom.
pub const NEIGHBORHOOD_SPREAD: f64 = 4.0 * SQRT_2;

/// Default iteration budget.
pub const DEFAULT_MAX_STEPS: u32 = 1 << 10;

/// Centre of the default view.
pub const DEFAULT_CENTER: Complex = Complex { re: -0.5, im: 0.0 };

/// The parameters of a view: grid size, window onto the plane, and
/// iteration budget.
///
/// Maps pixel coordinates to plane coordinates and back. Pixel `(x, y)` is
/// sampled at its centre `(x + ½, y + ½)`, the shorter grid dimension spans
/// [`PLANE_SPAN`]` / zoom` plane units, and the y-axis is flipped so that
/// increasing pixel-y moves toward negative imaginary parts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParams {
    /// Grid width in pixels.
    pub width: u32,

    /// Grid height in pixels.
    pub height: u32,

    /// Plane coordinate at the grid's optical centre.
    pub center: Complex,

    /// Magnification; 1 shows [`PLANE_SPAN`] units across the shorter side.
    pub zoom: f64,

    /// Escape-time cutoff.
    pub max_steps: u32,
}

impl ViewParams {
    /// Default view of the whole set for a grid of the given size.
    pub fn initial(width: u32, height: u32) -> crate::Result<Self> {
        Self::new(width, height, DEFAULT_CENTER, 1.0, DEFAULT_MAX_STEPS)
    }

    /// Create a view with explicit parameters.
    pub fn new(
        width: u32,
        height: u32,
        center: Complex,
        zoom: f64,
        max_steps: u32,
    ) -> crate::Result<Self> {
        validate_dimensions(width, height)?;
        validate_zoom(zoom)?;
        validate_center(center)?;
        if max_steps < 1 {
            return Err(CoreError::InvalidIterationBudget(max_steps));
        }
        Ok(Self {
            width,
            height,
            center,
            zoom,
            max_steps,
        })
    }

    /// The same view moved to a new centre and zoom.
    pub fn transformed(&self, zoom: f64, center: Complex) -> crate::Result<Self> {
        validate_zoom(zoom)?;
        validate_center(center)?;
        Ok(Self {
            zoom,
            center,
            ..*self
        })
    }

    /// The same window onto the plane over a grid of a different size.
    pub fn resized(&self, width: u32, height: u32) -> crate::Result<Self> {
        validate_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            ..*self
        })
    }

    /// Number of grid cells.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Row-major index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Whether a signed pixel coordinate lies on the grid.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Grid pixels per plane unit.
    #[inline]
    pub fn pixels_per_unit(&self) -> f64 {
        self.zoom / PLANE_SPAN * self.width.min(self.height) as f64
    }

    /// Plane units covered by one grid pixel.
    #[inline]
    pub fn units_per_pixel(&self) -> f64 {
        1.0 / self.pixels_per_unit()
    }

    /// Map a grid pixel to the plane coordinate at its centre.
    #[inline]
    pub fn pixel_to_plane(&self, x: u32, y: u32) -> Complex {
        let ppu = self.pixels_per_unit();
        Complex::new(
            self.center.re + (x as f64 + 0.5 - self.width as f64 / 2.0) / ppu,
            self.center.im - (y as f64 + 0.5 - self.height as f64 / 2.0) / ppu,
        )
    }

    /// Map a plane coordinate to the grid pixel containing it.
    ///
    /// Truncates toward zero, so results may lie off the grid; check with
    /// [`contains`](Self::contains).
    #[inline]
    pub fn plane_to_pixel(&self, c: Complex) -> (i64, i64) {
        let ppu = self.pixels_per_unit();
        let x = (c.re - self.center.re) * ppu + self.width as f64 / 2.0;
        let y = (self.center.im - c.im) * ppu + self.height as f64 / 2.0;
        (x as i64, y as i64)
    }

    /// Neighbourhood-cache pixels per plane unit.
    #[inline]
    fn neighborhood_pixels_per_unit(&self) -> f64 {
        self.zoom / PLANE_SPAN / NEIGHBORHOOD_SPREAD * NEIGHBORHOOD_RES as f64
    }

    /// Map a neighbourhood-cache pixel to the plane coordinate at its centre.
    ///
    /// The cache shares this view's centre but reaches
    /// [`NEIGHBORHOOD_SPREAD`] times further out.
    #[inline]
    pub fn neighborhood_to_plane(&self, x: u32, y: u32) -> Complex {
        let ppu = self.neighborhood_pixels_per_unit();
        let half = NEIGHBORHOOD_RES as f64 / 2.0;
        Complex::new(
            self.center.re + (x as f64 + 0.5 - half) / ppu,
            self.center.im - (y as f64 + 0.5 - half) / ppu,
        )
    }

    /// Map a plane coordinate into neighbourhood-cache pixel space.
    #[inline]
    pub fn plane_to_neighborhood(&self, c: Complex) -> (i64, i64) {
        let ppu = self.neighborhood_pixels_per_unit();
        let half = NEIGHBORHOOD_RES as f64 / 2.0;
        let x = (c.re - self.center.re) * ppu + half;
        let y = (self.center.im - c.im) * ppu + half;
        (x as i64, y as i64)
    }
}

/// Whether a signed pixel coordinate lies on the neighbourhood cache.
#[inline]
pub fn neighborhood_contains(x: i64, y: i64) -> bool {
    let res = NEIGHBORHOOD_RES as i64;
    x >= 0 && y >= 0 && x < res && y < res
}

fn validate_dimensions(width: u32, height: u32) -> crate::Result<()> {
    if width == 0 || height == 0 {
        return Err(CoreError::InvalidDimensions { width, height });
    }
    Ok(())
}

pub(crate) fn validate_zoom(zoom: f64) -> crate::Result<()> {
    if zoom <= 0.0 || !zoom.is_finite() {
        return Err(CoreError::InvalidZoom(zoom));
    }
    Ok(())
}

pub(crate) fn validate_center(center: Complex) -> crate::Result<()> {
    if !center.is_finite() {
        return Err(CoreError::InvalidCenter(center));
    }
    Ok(())
}
