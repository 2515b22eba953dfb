//! Contains the ViewSpec struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane centered on an arbitrary
//! point and scaled by a zoom factor.
use itertools::iproduct;
use num::Complex;
use std::ops::Range;

use errors::RenderError;

/// The vertical extent of the complex plane at zoom 1.0.
pub const BASE_RANGE: f64 = 3.0;

/// Describes the x, y of a pixel in the raster.  Column first, row
/// second, same as everywhere else in this crate.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The rectangle of the complex plane a raster covers, real axis
/// along x and imaginary axis along y.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    /// Leftmost real value, mapped to column 0.
    pub x_min: f64,
    /// Rightmost real value, mapped to the last column.
    pub x_max: f64,
    /// Imaginary value mapped to row 0.
    pub y_min: f64,
    /// Imaginary value mapped to the last row.
    pub y_max: f64,
}

/// Everything needed to map a pixel grid onto the complex plane and
/// decide how hard to look at each point.  Derived once per render;
/// there is no way to mutate one after construction.
#[derive(Copy, Clone, Debug)]
pub struct ViewSpec {
    width: usize,
    height: usize,
    center: Complex<f64>,
    zoom: f64,
    max_iterations: usize,
    bounds: Bounds,
    // The distance between adjacent pixels along each axis.
    steps: (f64, f64),
}

impl ViewSpec {
    /// Constructor.  The vertical extent of the view is `3.0 / zoom`
    /// and the horizontal extent follows the aspect ratio of the
    /// raster.  Rejects rasters narrower or shorter than two pixels,
    /// an iteration cap of zero, and zooms that are not positive.
    pub fn new(
        width: usize,
        height: usize,
        center: Complex<f64>,
        zoom: f64,
        max_iterations: usize,
    ) -> Result<ViewSpec, RenderError> {
        if width < 2 || height < 2 {
            return Err(RenderError::InvalidGeometry { width, height });
        }

        if max_iterations == 0 {
            return Err(RenderError::InvalidParameter(
                "Maximum iterations must be positive".to_string(),
            ));
        }

        if !(zoom > 0.0) || !zoom.is_finite() {
            return Err(RenderError::InvalidParameter(format!(
                "Zoom factor must be positive, got {}",
                zoom
            )));
        }

        if !center.re.is_finite() || !center.im.is_finite() {
            return Err(RenderError::InvalidParameter(
                "Center must be a finite point".to_string(),
            ));
        }

        let y_range = BASE_RANGE / zoom;
        let x_range = y_range * (width as f64) / (height as f64);
        let bounds = Bounds {
            x_min: center.re - x_range / 2.0,
            x_max: center.re + x_range / 2.0,
            y_min: center.im - y_range / 2.0,
            y_max: center.im + y_range / 2.0,
        };

        // A zoom deep enough to collapse the range below f64 resolution
        // leaves nothing to render.
        if !(bounds.x_max > bounds.x_min) || !(bounds.y_max > bounds.y_min) {
            return Err(RenderError::InvalidParameter(format!(
                "Zoom factor {} is too deep for double precision",
                zoom
            )));
        }

        let steps = (
            (bounds.x_max - bounds.x_min) / ((width - 1) as f64),
            (bounds.y_max - bounds.y_min) / ((height - 1) as f64),
        );

        Ok(ViewSpec {
            width,
            height,
            center,
            zoom,
            max_iterations,
            bounds,
            steps,
        })
    }

    /// Raster width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raster height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The point the view is centered on.
    pub fn center(&self) -> Complex<f64> {
        self.center
    }

    /// The zoom factor.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// The iteration cap for every point in this view.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// The rectangle of the complex plane covered by the raster.
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The total number of points in the integral grid.  Used to
    /// calculate memory needs.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// A view always holds at least four pixels.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Given a pixel on the integral cartesian plane, return the
    /// complex number at the equivalent location.  Column 0 maps to
    /// `x_min` and the last column to `x_max`; rows likewise run from
    /// `y_min` to `y_max`.
    pub fn point_at(&self, pixel: Pixel) -> Complex<f64> {
        Complex::new(
            self.bounds.x_min + (pixel.0 as f64) * self.steps.0,
            self.bounds.y_min + (pixel.1 as f64) * self.steps.1,
        )
    }

    /// Every (row, column) pair of the rows in `rows`, in row-major
    /// order.
    pub fn pixels(&self, rows: Range<usize>) -> impl Iterator<Item = (usize, usize)> {
        iproduct!(rows, 0..self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(width: usize, height: usize) -> ViewSpec {
        ViewSpec::new(width, height, Complex::new(-0.5, 0.0), 1.0, 50).unwrap()
    }

    #[test]
    fn viewspec_fails_on_degenerate_shape() {
        let origin = Complex::new(0.0, 0.0);
        assert!(ViewSpec::new(1, 4, origin, 1.0, 10).is_err());
        assert!(ViewSpec::new(4, 1, origin, 1.0, 10).is_err());
        assert!(ViewSpec::new(0, 0, origin, 1.0, 10).is_err());
        match ViewSpec::new(1, 1, origin, 1.0, 10) {
            Err(RenderError::InvalidGeometry { width, height }) => {
                assert_eq!((width, height), (1, 1));
            }
            other => panic!("expected InvalidGeometry, got {:?}", other),
        }
    }

    #[test]
    fn viewspec_fails_on_bad_parameters() {
        let origin = Complex::new(0.0, 0.0);
        assert!(ViewSpec::new(4, 4, origin, 0.0, 10).is_err());
        assert!(ViewSpec::new(4, 4, origin, -2.0, 10).is_err());
        assert!(ViewSpec::new(4, 4, origin, ::std::f64::NAN, 10).is_err());
        assert!(ViewSpec::new(4, 4, origin, 1.0, 0).is_err());
    }

    #[test]
    fn viewspec_passes_on_good_shape() {
        assert!(ViewSpec::new(2, 2, Complex::new(0.0, 0.0), 1.0, 1).is_ok());
    }

    #[test]
    fn bounds_follow_zoom_and_aspect() {
        let b = view(3, 3).bounds();
        assert_eq!(b.x_min, -2.0);
        assert_eq!(b.x_max, 1.0);
        assert_eq!(b.y_min, -1.5);
        assert_eq!(b.y_max, 1.5);

        let wide = ViewSpec::new(200, 100, Complex::new(0.0, 0.0), 2.0, 50).unwrap();
        let b = wide.bounds();
        assert!((b.y_max - b.y_min - 1.5).abs() < 1e-12);
        assert!((b.x_max - b.x_min - 3.0).abs() < 1e-12);
        assert!(b.x_max > b.x_min && b.y_max > b.y_min);
    }

    #[test]
    fn point_at_hits_the_corners_and_center() {
        let v = view(3, 3);
        assert_eq!(v.point_at(Pixel(0, 0)), Complex::new(-2.0, -1.5));
        assert_eq!(v.point_at(Pixel(1, 1)), Complex::new(-0.5, 0.0));
        assert_eq!(v.point_at(Pixel(2, 2)), Complex::new(1.0, 1.5));
        assert_eq!(v.point_at(Pixel(2, 0)), Complex::new(1.0, -1.5));
    }

    #[test]
    fn point_at_on_larger_planes() {
        let v = ViewSpec::new(5, 5, Complex::new(0.0, 0.0), 0.75, 50).unwrap();
        assert_eq!(v.point_at(Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(v.point_at(Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(v.point_at(Pixel(4, 4)), Complex::new(2.0, 2.0));
        assert_eq!(v.point_at(Pixel(1, 3)), Complex::new(-1.0, 1.0));
    }

    #[test]
    fn pixels_are_row_major() {
        let v = view(3, 2);
        let order: Vec<(usize, usize)> = v.pixels(0..2).collect();
        assert_eq!(
            order,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
        assert_eq!(v.pixels(1..2).count(), 3);
    }
}
