#[macro_use]
extern crate criterion;
extern crate escapetime;
extern crate num;

use criterion::Criterion;
use escapetime::escape::{iterate, iterate_lanes};
use escapetime::{Coloring, Renderer, Silent, StandardPalette, ViewSpec};
use num::Complex;

fn kernel(c: &mut Criterion) {
    let lanes = [
        Complex::new(-0.7436, 0.1318),
        Complex::new(-0.7437, 0.1319),
        Complex::new(-0.7438, 0.1317),
        Complex::new(-0.7435, 0.1316),
    ];
    c.bench_function("iterate x4", move |b| {
        b.iter(|| {
            lanes
                .iter()
                .map(|p| iterate(*p, 1000).0)
                .sum::<f64>()
        })
    });
    c.bench_function("iterate_lanes", move |b| b.iter(|| iterate_lanes(&lanes, 1000)));
}

fn frame(c: &mut Criterion) {
    c.bench_function("render 160x120 histogram", |b| {
        let view = ViewSpec::new(160, 120, Complex::new(-0.5, 0.0), 1.0, 500).unwrap();
        let renderer = Renderer::new(view, Coloring::Histogram);
        b.iter(|| renderer.render(&mut Silent).unwrap())
    });
    c.bench_function("render 160x120 standard", |b| {
        let view = ViewSpec::new(160, 120, Complex::new(-0.5, 0.0), 1.0, 500).unwrap();
        let renderer = Renderer::new(view, Coloring::Standard(StandardPalette::default()));
        b.iter(|| renderer.render(&mut Silent).unwrap())
    });
}

criterion_group!(benches, kernel, frame);
criterion_main!(benches);
