//! Writing finished rasters to disk.  The container is picked from
//! the file extension: PNG, or binary PPM for `.ppm` and `.pnm`.

use image::png::PNGEncoder;
use image::pnm::PNMEncoder;
use image::pnm::{PNMSubtype, SampleEncoding};
use image::ColorType;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use errors::RenderError;
use render::Raster;

/// The image formats a raster can be written as.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Container {
    /// Lossless RGB PNG.
    Png,
    /// Uncompressed binary pixmap, PPM P6.
    Ppm,
}

impl Container {
    /// Picks a container from a file name's extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Container, RenderError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match extension.as_ref().map(|e| e.as_str()) {
            Some("png") => Ok(Container::Png),
            Some("ppm") | Some("pnm") => Ok(Container::Ppm),
            _ => Err(RenderError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

/// Encodes `raster` into `output` as the given container.  The raster
/// is only read, so a failed write can be retried.
pub fn encode<W: Write>(
    container: Container,
    output: W,
    raster: &Raster,
) -> Result<(), RenderError> {
    let (width, height) = (raster.width() as u32, raster.height() as u32);
    match container {
        Container::Png => {
            let encoder = PNGEncoder::new(output);
            encoder.encode(raster.as_bytes(), width, height, ColorType::RGB(8))?;
        }
        Container::Ppm => {
            let mut encoder =
                PNMEncoder::new(output).with_subtype(PNMSubtype::Pixmap(SampleEncoding::Binary));
            encoder.encode(raster.as_bytes(), width, height, ColorType::RGB(8))?;
        }
    }
    Ok(())
}

/// Writes `raster` to `path`, choosing the container from the
/// extension.  Fails before touching the file system if the extension
/// is not one we can write.
pub fn write_image(path: &Path, raster: &Raster) -> Result<(), RenderError> {
    let container = Container::from_path(path)?;
    let mut output = BufWriter::new(File::create(path)?);
    encode(container, &mut output, raster)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    extern crate tempfile;

    use super::*;
    use num::Complex;
    use palette::{Coloring, StandardPalette};
    use planes::ViewSpec;
    use render::{Renderer, Silent};

    fn raster() -> Raster {
        let view = ViewSpec::new(6, 4, Complex::new(-0.5, 0.0), 1.0, 40).unwrap();
        Renderer::new(view, Coloring::Standard(StandardPalette::default()))
            .render(&mut Silent)
            .unwrap()
            .0
    }

    #[test]
    fn containers_follow_the_extension() {
        assert_eq!(Container::from_path(Path::new("a.png")).unwrap(), Container::Png);
        assert_eq!(Container::from_path(Path::new("a.PNG")).unwrap(), Container::Png);
        assert_eq!(Container::from_path(Path::new("b.ppm")).unwrap(), Container::Ppm);
        assert_eq!(Container::from_path(Path::new("b.pnm")).unwrap(), Container::Ppm);
        assert!(Container::from_path(Path::new("c.jpg")).is_err());
        assert!(Container::from_path(Path::new("noextension")).is_err());
    }

    #[test]
    fn ppm_carries_the_raw_bytes() {
        let raster = raster();
        let mut bytes = vec![];
        encode(Container::Ppm, &mut bytes, &raster).unwrap();
        assert!(bytes.starts_with(b"P6"));
        assert!(bytes.ends_with(raster.as_bytes()));
        assert!(bytes.len() > raster.as_bytes().len());
    }

    #[test]
    fn png_round_trips_through_the_decoder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let raster = raster();
        write_image(&path, &raster).unwrap();
        let decoded = ::image::open(&path).unwrap().to_rgb();
        assert_eq!(decoded.width(), 6);
        assert_eq!(decoded.height(), 4);
        assert_eq!(decoded.into_raw(), raster.into_bytes());
    }

    #[test]
    fn unwritable_paths_report_encoder_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");
        match write_image(&path, &raster()) {
            Err(RenderError::Encoder(_)) => {}
            other => panic!("expected an encoder failure, got {:?}", other),
        }
    }
}
