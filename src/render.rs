// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The raster driver.
//!
//! The image is cut into bands of whole rows.  Worker threads pull
//! bands off a shared queue until it runs dry, so a band full of slow
//! boundary pixels doesn't hold up a thread that drew the empty sky.
//! Every band is a disjoint slice of the output buffer, so no two
//! workers ever touch the same pixel and nothing needs to be locked
//! except the queue itself.
//!
//! The standard palette colors each band as soon as it has been
//! evaluated.  The equalized palette can't: it needs to know how every
//! pixel in the image escaped before it can color any of them, so it
//! runs the evaluation over the whole image first, builds the
//! histogram, and only then starts a second pass to color.

use crossbeam::channel;
use num::Complex;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use errors::RenderError;
use escape::{iterate, iterate_lanes, Evaluator, Method, LANES};
use histogram::Histogram;
use palette::{Coloring, Rgb};
use planes::{Pixel, ViewSpec};

/// The number of rows handed to a worker at a time.
pub const BAND_ROWS: usize = 16;

/// Obtains a zeroed buffer of `len` elements, or reports how much
/// memory was refused.
fn allocate<T: Clone>(len: usize, fill: T) -> Result<Vec<T>, RenderError> {
    let bytes = len
        .checked_mul(mem::size_of::<T>())
        .ok_or(RenderError::Allocation { bytes: ::std::usize::MAX })?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| RenderError::Allocation { bytes })?;
    buffer.resize(len, fill);
    Ok(buffer)
}

/// A finished image: row-major RGB, three bytes per pixel, no
/// padding.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Raster {
    /// An all-black raster.
    pub fn new(width: usize, height: usize) -> Result<Raster, RenderError> {
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(3))
            .ok_or(RenderError::Allocation { bytes: ::std::usize::MAX })?;
        Ok(Raster {
            width,
            height,
            pixels: allocate(len, 0)?,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The color at a pixel.
    pub fn pixel(&self, pixel: Pixel) -> Rgb {
        let offset = (pixel.1 * self.width + pixel.0) * 3;
        Rgb(
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        )
    }

    /// The raw bytes, ready for an encoder.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Gives up the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }
}

/// How many pixels each method settled.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Pixels inside the main cardioid.
    pub cardioid: usize,
    /// Pixels inside the period-2 bulb.
    pub bulb: usize,
    /// Pixels settled by the series estimate.
    pub series: usize,
    /// Pixels iterated until they escaped.
    pub escaped: usize,
    /// Pixels iterated to the cap.
    pub bounded: usize,
}

impl RenderStats {
    /// Counts one pixel.
    pub fn record(&mut self, method: Method) {
        match method {
            Method::Cardioid => self.cardioid += 1,
            Method::Bulb => self.bulb += 1,
            Method::Series => self.series += 1,
            Method::Escaped => self.escaped += 1,
            Method::Bounded => self.bounded += 1,
        }
    }

    /// Folds another worker's counts into these.
    pub fn merge(&mut self, other: &RenderStats) {
        self.cardioid += other.cardioid;
        self.bulb += other.bulb;
        self.series += other.series;
        self.escaped += other.escaped;
        self.bounded += other.bounded;
    }

    /// Pixels settled without iterating at all.
    pub fn skipped(&self) -> usize {
        self.cardioid + self.bulb
    }

    /// Every pixel counted.
    pub fn total(&self) -> usize {
        self.cardioid + self.bulb + self.series + self.escaped + self.bounded
    }

    /// Writes the counts to the log, with each as a share of the
    /// image.
    pub fn log(&self) {
        let total = self.total().max(1) as f64;
        let share = |n: usize| 100.0 * n as f64 / total;
        info!(
            "Cardioid/bulb detection: {} pixels ({:.1}% of total)",
            self.skipped(),
            share(self.skipped())
        );
        if self.series > 0 {
            info!(
                "Series approximation: {} pixels ({:.1}% of total)",
                self.series,
                share(self.series)
            );
        }
        info!(
            "Iterated: {} escaped, {} reached the cap",
            self.escaped, self.bounded
        );
    }
}

/// The two passes a render can make over the image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Computing escape values.
    Evaluate,
    /// Turning escape values into colors.
    Color,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Phase::Evaluate => write!(f, "Computing"),
            Phase::Color => write!(f, "Coloring"),
        }
    }
}

/// Something that wants to hear how far along a render is.  Reports
/// come from the thread that called `render`, after each band, with
/// the fraction of the current phase that is done.
pub trait Progress {
    /// Called after each band of `phase` finishes.
    fn report(&mut self, phase: Phase, fraction: f64);
}

/// Ignores every report.
pub struct Silent;

impl Progress for Silent {
    fn report(&mut self, _phase: Phase, _fraction: f64) {}
}

/// Logs each phase every time it crosses another tenth of the way.
pub struct LogProgress {
    started: Instant,
    last: Option<(Phase, usize)>,
}

impl LogProgress {
    /// Starts the clock.
    pub fn new() -> Self {
        LogProgress {
            started: Instant::now(),
            last: None,
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        LogProgress::new()
    }
}

impl Progress for LogProgress {
    fn report(&mut self, phase: Phase, fraction: f64) {
        let percent = (fraction * 100.0).floor() as usize / 10 * 10;
        let previous = match self.last {
            Some((p, percent)) if p == phase => percent,
            _ => 0,
        };
        if percent > previous {
            let elapsed = self.started.elapsed();
            info!(
                "{}: {}% complete ({}.{:01}s elapsed)",
                phase,
                percent,
                elapsed.as_secs(),
                elapsed.subsec_millis() / 100
            );
            self.last = Some((phase, percent));
        }
    }
}

/// Renders one view with one palette.  Once set, this object should
/// not be mutable.
pub struct Renderer {
    view: ViewSpec,
    evaluator: Evaluator,
    coloring: Coloring,
    threads: usize,
}

impl Renderer {
    /// Uses one thread per CPU and every evaluator shortcut.
    pub fn new(view: ViewSpec, coloring: Coloring) -> Self {
        Renderer {
            view,
            evaluator: Evaluator::new(view.max_iterations()),
            coloring,
            threads: ::num_cpus::get(),
        }
    }

    /// Sets the number of worker threads.
    pub fn with_threads(self, threads: usize) -> Result<Self, RenderError> {
        if threads == 0 {
            return Err(RenderError::InvalidParameter(
                "Thread count must be at least 1".to_string(),
            ));
        }
        Ok(Renderer { threads, ..self })
    }

    /// Turns the series estimate on or off.
    pub fn with_series(self, series: bool) -> Self {
        Renderer {
            evaluator: self.evaluator.with_series(series),
            ..self
        }
    }

    /// The view being rendered.
    pub fn view(&self) -> &ViewSpec {
        &self.view
    }

    /// The number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Renders the whole image.  Every buffer is obtained before any
    /// pixel is computed, so a render either fails up front or hands
    /// back a complete raster.
    pub fn render(&self, progress: &mut dyn Progress) -> Result<(Raster, RenderStats), RenderError> {
        let width = self.view.width();
        let bounds = self.view.bounds();
        debug!(
            "Coordinate bounds: [{:.10}, {:.10}] x [{:.10}, {:.10}]",
            bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max
        );

        let mut raster = Raster::new(width, self.view.height())?;
        let started = Instant::now();

        if !self.coloring.needs_histogram() {
            info!("Computing and coloring using {} threads", self.threads);
            let stats = self.run_bands(
                Phase::Evaluate,
                &mut raster.pixels,
                width * 3,
                progress,
                |first, band| {
                    let mut escapes = vec![0.0_f64; band.len() / 3];
                    let stats = self.evaluate_band(first, &mut escapes);
                    self.color_band(&escapes, band, None);
                    stats
                },
            )?;
            log_elapsed("Render", started);
            return Ok((raster, stats));
        }

        let mut escapes = allocate(self.view.len(), 0.0_f64)?;
        info!("Computing escape values using {} threads", self.threads);
        let stats = self.run_bands(
            Phase::Evaluate,
            &mut escapes,
            width,
            progress,
            |first, band| self.evaluate_band(first, band),
        )?;
        log_elapsed("Computation phase", started);

        let histogram = self.histogram(&escapes)?;
        info!(
            "Histogram built: {} pixels outside set, max frequency: {}",
            histogram.total(),
            histogram.max_count()
        );

        let escapes = &escapes;
        let histogram = &histogram;
        self.run_bands(
            Phase::Color,
            &mut raster.pixels,
            width * 3,
            progress,
            |first, band| {
                let start = first * width;
                self.color_band(&escapes[start..start + band.len() / 3], band, Some(histogram));
                RenderStats::default()
            },
        )?;
        log_elapsed("Render", started);
        Ok((raster, stats))
    }

    /// Fills `band` with escape values for the rows starting at
    /// `first`.  Points that none of the shortcuts settle are gathered
    /// up and iterated `LANES` at a time.
    fn evaluate_band(&self, first: usize, band: &mut [f64]) -> RenderStats {
        let width = self.view.width();
        let max_iterations = self.evaluator.max_iterations();
        let rows = first..first + band.len() / width;

        let mut stats = RenderStats::default();
        let mut points = [Complex::new(0.0, 0.0); LANES];
        let mut slots = [0_usize; LANES];
        let mut pending = 0;

        for (row, column) in self.view.pixels(rows) {
            let slot = (row - first) * width + column;
            let c = self.view.point_at(Pixel(column, row));
            if let Some((value, method)) = self.evaluator.shortcut(c) {
                band[slot] = value;
                stats.record(method);
                continue;
            }

            points[pending] = c;
            slots[pending] = slot;
            pending += 1;
            if pending == LANES {
                let values = iterate_lanes(&points, max_iterations);
                for lane in 0..LANES {
                    band[slots[lane]] = values[lane];
                    stats.record(if values[lane] < max_iterations as f64 {
                        Method::Escaped
                    } else {
                        Method::Bounded
                    });
                }
                pending = 0;
            }
        }

        for lane in 0..pending {
            let (value, method) = iterate(points[lane], max_iterations);
            band[slots[lane]] = value;
            stats.record(method);
        }
        stats
    }

    fn color_band(&self, escapes: &[f64], band: &mut [u8], histogram: Option<&Histogram>) {
        let max_iterations = self.evaluator.max_iterations();
        for (value, pixel) in escapes.iter().zip(band.chunks_mut(3)) {
            let Rgb(r, g, b) = self.coloring.color(*value, max_iterations, histogram);
            pixel[0] = r;
            pixel[1] = g;
            pixel[2] = b;
        }
    }

    /// Builds partial histograms over equal slices of the grid in
    /// parallel and merges them.
    fn histogram(&self, escapes: &[f64]) -> Result<Histogram, RenderError> {
        let max_iterations = self.evaluator.max_iterations();
        let chunk = ((escapes.len() + self.threads - 1) / self.threads).max(1);
        let parts = crossbeam::scope(|spawner| {
            let handles: Vec<_> = escapes
                .chunks(chunk)
                .map(|part| spawner.spawn(move |_| Histogram::build(part, max_iterations)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Result<Vec<Histogram>, _>>()
        })
        .map_err(|_| RenderError::WorkerPanic)?
        .map_err(|_| RenderError::WorkerPanic)?;
        Ok(Histogram::merge(&parts).unwrap_or_else(|| Histogram::build(&[], max_iterations)))
    }

    /// Splits `buffer` into bands of `BAND_ROWS` rows of `row_len`
    /// elements and runs `work` over them on the worker threads.
    /// `work` gets the index of the band's first row and the band
    /// itself.  Reports progress as bands come back.
    fn run_bands<T, F>(
        &self,
        phase: Phase,
        buffer: &mut [T],
        row_len: usize,
        progress: &mut dyn Progress,
        work: F,
    ) -> Result<RenderStats, RenderError>
    where
        T: Send,
        F: Fn(usize, &mut [T]) -> RenderStats + Sync,
    {
        let bands: Vec<(usize, &mut [T])> = buffer
            .chunks_mut(row_len * BAND_ROWS)
            .enumerate()
            .map(|(index, band)| (index * BAND_ROWS, band))
            .collect();
        let total = bands.len();
        let bands = Arc::new(Mutex::new(bands.into_iter()));
        let work = &work;

        crossbeam::scope(|spawner| {
            let (sender, receiver) = channel::unbounded();
            for _ in 0..self.threads.min(total) {
                let bands = bands.clone();
                let sender = sender.clone();
                spawner.spawn(move |_| loop {
                    let band = match bands.lock() {
                        Ok(mut queue) => queue.next(),
                        Err(_) => None,
                    };
                    match band {
                        Some((first, band)) => {
                            if sender.send(work(first, band)).is_err() {
                                break;
                            }
                        }
                        None => {
                            break;
                        }
                    }
                });
            }
            drop(sender);

            let mut stats = RenderStats::default();
            for (done, band) in receiver.iter().enumerate() {
                stats.merge(&band);
                progress.report(phase, (done + 1) as f64 / total as f64);
            }
            stats
        })
        .map_err(|_| RenderError::WorkerPanic)
    }
}

fn log_elapsed(what: &str, started: Instant) {
    let elapsed = started.elapsed();
    info!(
        "{} completed in {}.{:02} seconds",
        what,
        elapsed.as_secs(),
        elapsed.subsec_millis() / 10
    );
}
