// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The ways a single render can fail.  None of them are retried; a
//! failed render leaves nothing half-written behind.

use failure::Fail;
use std::io;

/// Everything that can stop a render, from bad geometry on the way in
/// to a failed write on the way out.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The raster needs at least two pixels along each axis, since the
    /// plane mapper divides by `width - 1` and `height - 1`.
    #[fail(display = "Image must be at least 2x2 pixels, got {}x{}", width, height)]
    InvalidGeometry {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
    },

    /// A numeric parameter outside its permitted range.
    #[fail(display = "Invalid parameter: {}", _0)]
    InvalidParameter(String),

    /// The raster or escape buffer could not be obtained.
    #[fail(display = "Failed to allocate {} bytes of image memory", bytes)]
    Allocation {
        /// The size of the refused request.
        bytes: usize,
    },

    /// A worker thread panicked before finishing its bands.
    #[fail(display = "A render worker panicked")]
    WorkerPanic,

    /// The output file name does not end in an extension we can write.
    #[fail(display = "Unsupported output format: {}", _0)]
    UnsupportedFormat(String),

    /// The image encoder could not write the finished raster.
    #[fail(display = "Failed to write image: {}", _0)]
    Encoder(#[cause] io::Error),
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        RenderError::Encoder(err)
    }
}
