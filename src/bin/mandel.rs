extern crate clap;
extern crate env_logger;
extern crate escapetime;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use escapetime::{
    write_image, Coloring, Container, LogProgress, RenderConfig, RenderError, StandardPalette,
};
use num::Complex;
use std::path::Path;
use std::str::FromStr;
use std::time::Instant;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_size(s: &str) -> Result<(), String> {
    match parse_pair::<u32>(s, 'x') {
        Some((w, h)) if w > 1 && h > 1 => Ok(()),
        Some(_) => Err("Width and height must both be at least 2".to_string()),
        None => Err("Could not parse output image size".to_string()),
    }
}

fn validate_zoom(s: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(z) if z > 0.0 && z.is_finite() => Ok(()),
        Ok(_) => Err("Zoom factor must be positive".to_string()),
        Err(_) => Err("Could not parse zoom factor".to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const ITERATIONS: &str = "iterations";
const THREADS: &str = "threads";
const COLORING: &str = "coloring";
const CYCLES: &str = "cycles";
const GAMMA: &str = "gamma";
const NO_SERIES: &str = "no-series";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("mandel")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Escape-time Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("mandelbrot.png")
                .help("Output file, .png or .ppm"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1920x1080")
                .validator(|s| validate_size(&s))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.5,0.0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Point at the center of the image, as re,im"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("1.0")
                .validator(|s| validate_zoom(&s))
                .help("Zoom factor; higher is more magnified"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("1000")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        10_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 10000000",
                    )
                })
                .help("Maximum iterations per pixel"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in solver [default: one per CPU]"),
        )
        .arg(
            Arg::with_name(COLORING)
                .required(false)
                .long(COLORING)
                .short("m")
                .takes_value(true)
                .possible_values(&["standard", "histogram"])
                .default_value("histogram")
                .help("Color mapping"),
        )
        .arg(
            Arg::with_name(CYCLES)
                .required(false)
                .long(CYCLES)
                .takes_value(true)
                .default_value("4.0")
                .validator(|s| {
                    validate_range(
                        &s,
                        0.0,
                        1000.0,
                        "Could not parse cycle count",
                        "Cycle count must be between 0 and 1000",
                    )
                })
                .help("Palette cycles over the iteration range (standard coloring)"),
        )
        .arg(
            Arg::with_name(GAMMA)
                .required(false)
                .long(GAMMA)
                .takes_value(true)
                .default_value("0.4")
                .validator(|s| {
                    validate_range(
                        &s,
                        0.0,
                        10.0,
                        "Could not parse gamma",
                        "Gamma must be between 0 and 10",
                    )
                })
                .help("Brightness falloff toward the set (standard coloring)"),
        )
        .arg(
            Arg::with_name(NO_SERIES)
                .long(NO_SERIES)
                .help("Disable series approximation"),
        )
        .get_matches()
}

// Every value but the thread count has a default and a validator, so
// the parses below cannot fail once clap has accepted the arguments.
fn config(matches: &ArgMatches) -> Option<RenderConfig> {
    let (width, height) = parse_pair::<usize>(matches.value_of(SIZE)?, 'x')?;
    let coloring = match matches.value_of(COLORING)? {
        "standard" => Coloring::Standard(StandardPalette {
            cycles: f64::from_str(matches.value_of(CYCLES)?).ok()?,
            gamma: f64::from_str(matches.value_of(GAMMA)?).ok()?,
        }),
        _ => Coloring::Histogram,
    };
    Some(RenderConfig {
        width,
        height,
        center: parse_complex(matches.value_of(CENTER)?)?,
        zoom: f64::from_str(matches.value_of(ZOOM)?).ok()?,
        max_iterations: usize::from_str(matches.value_of(ITERATIONS)?).ok()?,
        coloring,
        series: !matches.is_present(NO_SERIES),
        threads: match matches.value_of(THREADS) {
            Some(threads) => usize::from_str(threads).ok()?,
            None => num_cpus::get(),
        },
    })
}

fn run(config: &RenderConfig, output: &Path) -> Result<(), RenderError> {
    // Refuse a bad file name before spending any time rendering.
    Container::from_path(output)?;
    let renderer = config.renderer()?;

    config.log();
    info!(
        "Memory requirements: {:.1} MB",
        config.memory_required() as f64 / (1024.0 * 1024.0)
    );

    let started = Instant::now();
    let (raster, stats) = renderer.render(&mut LogProgress::new())?;
    let rendered = started.elapsed();

    info!("Writing {}", output.display());
    write_image(output, &raster)?;

    let seconds = rendered.as_secs() as f64 + f64::from(rendered.subsec_nanos()) * 1e-9;
    if seconds > 0.0 {
        info!(
            "Performance: {:.0} pixels/second",
            stats.total() as f64 / seconds
        );
    }
    stats.log();
    info!("Output saved to: {}", output.display());
    Ok(())
}

fn main() {
    env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = args();
    let config = match config(&matches) {
        Some(config) => config,
        None => {
            eprintln!("Render failure: could not parse arguments");
            std::process::exit(1);
        }
    };
    let output = Path::new(matches.value_of(OUTPUT).unwrap_or("mandelbrot.png"));

    if let Err(e) = run(&config, output) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
