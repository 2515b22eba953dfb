#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which the orbit `z ← z² + c`, started at zero, stays bounded
//! forever.  We can't iterate forever, so every pixel gets a budget
//! of iterations; points that are still bounded when it runs out are
//! painted black, and every other point is colored by how quickly it
//! ran away.
//!
//! Rendering is a one-way pipeline.  A `ViewSpec` maps the pixel grid
//! onto the plane; an `Evaluator` turns each point into a smooth
//! escape value, short-circuiting the interior regions it can
//! recognize on sight; an optional `Histogram` records how the escape
//! values are distributed; a `Coloring` turns each value into RGB; and
//! the `Renderer` drives all of it across worker threads and hands
//! back a `Raster` ready to be written out.

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

pub mod config;
pub mod errors;
pub mod escape;
pub mod histogram;
pub mod output;
pub mod palette;
pub mod planes;
pub mod render;

pub use config::RenderConfig;
pub use errors::RenderError;
pub use escape::{evaluate, Evaluator, Method};
pub use histogram::Histogram;
pub use output::{write_image, Container};
pub use palette::{Coloring, Rgb, StandardPalette};
pub use planes::{Pixel, ViewSpec};
pub use render::{LogProgress, Phase, Progress, Raster, RenderStats, Renderer, Silent};
