use crate::color::Hsl;
use crate::raster::{GradientStop, Raster};
use crate::theme::ThemeState;
use std::fmt;
use tracing::debug;

// ============================================================================
// OVERLAY
// ============================================================================

/// One `radial-gradient(circle at X% Y%, color 0%, transparent EXTENT%)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGlow {
    /// Center as a fraction of the viewport.
    pub center: (f32, f32),
    pub color: Hsl,
    /// Alpha at the center, fading to zero at `extent`.
    pub alpha: f32,
    /// Fade-out distance as a fraction of the distance to the farthest
    /// corner.
    pub extent: f32,
}

impl RadialGlow {
    fn radius(&self, width: f32, height: f32) -> f32 {
        let (cx, cy) = (self.center.0 * width, self.center.1 * height);
        let dx = cx.max(width - cx);
        let dy = cy.max(height - cy);
        (dx * dx + dy * dy).sqrt() * self.extent
    }

    fn draw(&self, raster: &mut Raster) {
        let (w, h) = (raster.width() as f32, raster.height() as f32);
        let color = self.color.to_rgb();
        let stops = [
            GradientStop::new(0.0, color, self.alpha),
            GradientStop::new(1.0, color, 0.0),
        ];
        raster.fill_radial(
            self.center.0 * w,
            self.center.1 * h,
            self.radius(w, h),
            &stops,
        );
    }
}

impl fmt::Display for RadialGlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "radial-gradient(circle at {}% {}%, hsl({} {}% {}% / {}) 0%, transparent {}%)",
            (self.center.0 * 100.0).round(),
            (self.center.1 * 100.0).round(),
            self.color.h,
            self.color.s,
            self.color.l,
            self.alpha,
            (self.extent * 100.0).round()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlayGradient {
    pub layers: Vec<RadialGlow>,
}

impl OverlayGradient {
    pub fn for_state(state: &ThemeState) -> Self {
        if state.dark_mode {
            return Self::default();
        }
        let color = state.primary();
        Self {
            layers: vec![
                RadialGlow {
                    center: (0.3, 0.3),
                    color,
                    alpha: 0.10,
                    extent: 0.45,
                },
                RadialGlow {
                    center: (0.7, 0.7),
                    color,
                    alpha: 0.08,
                    extent: 0.40,
                },
            ],
        }
    }

    pub fn is_none(&self) -> bool {
        self.layers.is_empty()
    }
}

impl fmt::Display for OverlayGradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.layers.is_empty() {
            return f.write_str("none");
        }
        for (i, layer) in self.layers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{layer}")?;
        }
        Ok(())
    }
}

/// The single persistent overlay.
#[derive(Debug, Default)]
pub struct Overlay {
    gradient: OverlayGradient,
    updates: u64,
}

impl Overlay {
    pub fn new(state: &ThemeState) -> Self {
        Self {
            gradient: OverlayGradient::for_state(state),
            updates: 0,
        }
    }

    pub fn gradient(&self) -> &OverlayGradient {
        &self.gradient
    }

    /// How many times `apply` actually changed the gradient.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Recomputes the gradient for `state`. Returns whether it changed.
    pub fn apply(&mut self, state: &ThemeState) -> bool {
        let next = OverlayGradient::for_state(state);
        if next == self.gradient {
            return false;
        }
        debug!(background = %next, "overlay updated");
        self.gradient = next;
        self.updates += 1;
        true
    }

    pub fn render(&self, raster: &mut Raster) {
        for layer in &self.gradient.layers {
            layer.draw(raster);
        }
    }
}
