use crate::color::ColorMode;
use crate::complex::Complex;
use crate::view::{validate_center, validate_zoom, ViewParams};

/// The part of a view that is worth saving: where it looks and how it is
/// shaded.
///
/// Construction validates every field, so a `PlaneState` in hand is always
/// safe to apply. Deserialization goes through the same checks.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PlaneState {
    center: Complex,
    zoom: f64,
    color_mode: ColorMode,
}

impl<'de> serde::Deserialize<'de> for PlaneState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            center: Complex,
            zoom: f64,
            color_mode: ColorMode,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.center, raw.zoom, raw.color_mode).map_err(serde::de::Error::custom)
    }
}

impl PlaneState {
    pub fn new(center: Complex, zoom: f64, color_mode: ColorMode) -> crate::Result<Self> {
        validate_center(center)?;
        validate_zoom(zoom)?;
        Ok(Self {
            center,
            zoom,
            color_mode,
        })
    }

    /// The state a view is currently showing.
    pub fn of_view(view: &ViewParams, color_mode: ColorMode) -> Self {
        Self {
            center: view.center,
            zoom: view.zoom,
            color_mode,
        }
    }

    /// Build from externally parsed fields, rejecting the whole triple if
    /// any one of them is out of range.
    pub fn from_parts(center: Complex, zoom: f64, color_index: i64) -> crate::Result<Self> {
        let color_mode = ColorMode::from_index(color_index)?;
        Self::new(center, zoom, color_mode)
    }

    pub fn center(&self) -> Complex {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }
}
