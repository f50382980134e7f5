use tracing::debug;

use tilebrot_core::view::{DEFAULT_CENTER, DEFAULT_MAX_STEPS};
use tilebrot_core::{Complex, Evaluator, ViewParams};
use tilebrot_engine::Engine;

/// Smallest zoom the driver will go to.
pub const MIN_ZOOM: f64 = 0.25;

/// Recentres are refused once the centre is this far from `-1`.
pub const MAX_CENTER_DISTANCE: f64 = 6.0;

/// Fraction of a zoom-1 screen moved by one pan step.
const PAN_STEP: f64 = 0.5;

/// Budget used by [`BudgetStep::High`].
const HIGH_BUDGET: u32 = DEFAULT_MAX_STEPS << 5;

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Zoom and centre a navigation step wants to move to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub zoom: f64,
    pub center: Complex,
}

impl Target {
    pub fn of(view: &ViewParams) -> Self {
        Self {
            zoom: view.zoom,
            center: view.center,
        }
    }

    /// The default view.
    pub fn home() -> Self {
        Self {
            zoom: 1.0,
            center: DEFAULT_CENTER,
        }
    }

    /// Clamp the zoom and refuse a centre that strays too far, keeping
    /// `current`'s centre instead.
    pub fn bounded(self, current: &ViewParams) -> Self {
        let zoom = self.zoom.max(MIN_ZOOM);
        let center = if (self.center + Complex::new(1.0, 0.0)).norm() >= MAX_CENTER_DISTANCE {
            current.center
        } else {
            self.center
        };
        Self { zoom, center }
    }
}

/// Step `zoom` to the next power of √2 up (`step > 0`) or down. Powers of
/// two come out exact.
pub fn next_zoom(zoom: f64, step: i32) -> f64 {
    let level = (zoom.log2() * 2.0).round() as i32 + step;
    2f64.powf(level as f64 / 2.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Pan {
    Up,
    Down,
    Left,
    Right,
}

/// Move half a zoom-1 screen in `direction`, scaled by the zoom.
pub fn pan(view: &ViewParams, direction: Pan) -> Target {
    let step = PAN_STEP / view.zoom;
    let delta = match direction {
        Pan::Up => Complex::new(0.0, step),
        Pan::Down => Complex::new(0.0, -step),
        Pan::Left => Complex::new(-step, 0.0),
        Pan::Right => Complex::new(step, 0.0),
    };
    Target {
        zoom: view.zoom,
        center: view.center + delta,
    }
}

/// Recentre on a pixel and zoom `step` levels around it.
pub fn zoom_at(view: &ViewParams, x: u32, y: u32, step: i32) -> Target {
    Target {
        zoom: next_zoom(view.zoom, step),
        center: view.pixel_to_plane(x, y),
    }
}

/// Move `engine` to `target` within bounds. Returns whether the view
/// changed; the caller requests a compute if it did.
pub fn navigate<E>(engine: &Engine<E>, target: Target) -> tilebrot_engine::Result<bool>
where
    E: Evaluator + Send + Sync + 'static,
{
    let view = engine.view();
    let target = target.bounded(&view);
    if target == Target::of(&view) {
        return Ok(false);
    }
    debug!(zoom = target.zoom, center = %target.center, "Navigating");
    engine.transform(target.zoom, target.center)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Iteration budget
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BudgetStep {
    /// One step; shows the bare outline.
    Minimum,
    Halve,
    Double,
    Reset,
    /// Thirty-two times the default.
    High,
}

impl BudgetStep {
    pub fn apply(self, current: u32) -> u32 {
        match self {
            Self::Minimum => 1,
            Self::Halve => (current / 2).max(1),
            Self::Double => current.saturating_mul(2),
            Self::Reset => DEFAULT_MAX_STEPS,
            Self::High => HIGH_BUDGET,
        }
    }
}
