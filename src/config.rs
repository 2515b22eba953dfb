//! Every knob a render has, with the defaults the `mandel` binary
//! falls back on.

use num::Complex;
use std::mem;

use errors::RenderError;
use palette::Coloring;
use planes::ViewSpec;
use render::Renderer;

/// A complete description of one render.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// The point at the center of the image.
    pub center: Complex<f64>,
    /// Magnification; at 1.0 the image is 3.0 units tall.
    pub zoom: f64,
    /// Iteration cap per pixel.
    pub max_iterations: usize,
    /// The palette.
    pub coloring: Coloring,
    /// Whether the series estimate may settle pixels.
    pub series: bool,
    /// Worker thread count.
    pub threads: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1920,
            height: 1080,
            center: Complex::new(-0.5, 0.0),
            zoom: 1.0,
            max_iterations: 1000,
            coloring: Coloring::default(),
            series: true,
            threads: ::num_cpus::get(),
        }
    }
}

impl RenderConfig {
    /// Validates the geometry and derives the view.
    pub fn view(&self) -> Result<ViewSpec, RenderError> {
        ViewSpec::new(
            self.width,
            self.height,
            self.center,
            self.zoom,
            self.max_iterations,
        )
    }

    /// Validates everything and builds a renderer.
    pub fn renderer(&self) -> Result<Renderer, RenderError> {
        Renderer::new(self.view()?, self.coloring)
            .with_series(self.series)
            .with_threads(self.threads)
    }

    /// The bytes the render will hold at its peak: the raster, plus
    /// the full grid of escape values when the palette needs them.
    pub fn memory_required(&self) -> usize {
        let pixels = self.width.saturating_mul(self.height);
        let per_pixel = if self.coloring.needs_histogram() {
            3 + mem::size_of::<f64>()
        } else {
            3
        };
        pixels.saturating_mul(per_pixel)
    }

    /// Writes the settings to the log.
    pub fn log(&self) {
        info!(
            "Resolution: {}x{} pixels ({} megapixels)",
            self.width,
            self.height,
            self.width * self.height / 1_000_000
        );
        info!("Max iterations: {}", self.max_iterations);
        info!("Zoom level: {:.6}x", self.zoom);
        info!(
            "Center point: ({:.10}, {:.10})",
            self.center.re, self.center.im
        );
        info!(
            "Coloring: {}, series approximation: {}",
            match self.coloring {
                Coloring::Histogram => "histogram".to_string(),
                Coloring::Standard(p) => format!("standard (cycles={}, gamma={})", p.cycles, p.gamma),
            },
            if self.series { "enabled" } else { "disabled" }
        );
        info!("CPU threads: {}", self.threads);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::StandardPalette;

    #[test]
    fn defaults_render_the_whole_set() {
        let config = RenderConfig::default();
        let view = config.view().unwrap();
        let bounds = view.bounds();
        assert!(bounds.x_min < -2.0 && bounds.x_max > 0.25);
        assert!(config.threads >= 1);
        assert!(config.renderer().is_ok());
    }

    #[test]
    fn settings_carry_through_to_the_renderer() {
        let config = RenderConfig {
            width: 40,
            height: 30,
            center: Complex::new(-0.75, 0.1),
            zoom: 8.0,
            threads: 3,
            ..RenderConfig::default()
        };
        let renderer = config.renderer().unwrap();
        assert_eq!(renderer.threads(), 3);
        assert_eq!(renderer.view().center(), Complex::new(-0.75, 0.1));
        assert_eq!(renderer.view().zoom(), 8.0);
        assert_eq!(renderer.view().width(), 40);
        assert_eq!(renderer.view().height(), 30);
    }

    #[test]
    fn invalid_settings_never_build_a_renderer() {
        let thin = RenderConfig {
            width: 1,
            ..RenderConfig::default()
        };
        assert!(thin.renderer().is_err());

        let idle = RenderConfig {
            threads: 0,
            ..RenderConfig::default()
        };
        assert!(idle.renderer().is_err());
    }

    #[test]
    fn memory_depends_on_the_palette() {
        let histogram = RenderConfig {
            width: 10,
            height: 10,
            ..RenderConfig::default()
        };
        let standard = RenderConfig {
            coloring: Coloring::Standard(StandardPalette::default()),
            ..histogram
        };
        assert_eq!(histogram.memory_required(), 1100);
        assert_eq!(standard.memory_required(), 300);
    }
}
