use celestial_figures::chapters::chapters;
use celestial_figures::render::render_svg;
use celestial_figures::setup_style;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_build(c: &mut Criterion) {
    let style = setup_style();
    let mut group = c.benchmark_group("build");
    for chapter in chapters() {
        for entry in chapter.figures {
            let id = format!("ch{:02}-{}", chapter.number, entry.name);
            group.bench_with_input(BenchmarkId::from_parameter(id), entry, |b, entry| {
                b.iter(|| (entry.build)(black_box(&style)))
            });
        }
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let style = setup_style();
    let mut group = c.benchmark_group("render_svg");
    for chapter in chapters() {
        for entry in chapter.figures {
            let figure = (entry.build)(&style);
            let id = format!("ch{:02}-{}", chapter.number, entry.name);
            group.bench_with_input(BenchmarkId::from_parameter(id), &figure, |b, figure| {
                b.iter(|| render_svg(black_box(figure), 0.1))
            });
        }
    }
    group.finish();
}

#[cfg(feature = "png")]
fn bench_rasterize(c: &mut Criterion) {
    use celestial_figures::render::rasterize_png;
    let style = setup_style();
    let mut group = c.benchmark_group("rasterize_png");
    group.sample_size(10);
    for chapter in chapters().iter().take(1) {
        for entry in chapter.figures {
            let svg = render_svg(&(entry.build)(&style), 0.1).svg;
            let id = format!("ch{:02}-{}", chapter.number, entry.name);
            group.bench_with_input(BenchmarkId::from_parameter(id), &svg, |b, svg| {
                b.iter(|| rasterize_png(black_box(svg), 150.0))
            });
        }
    }
    group.finish();
}

#[cfg(feature = "png")]
criterion_group!(benches, bench_build, bench_render, bench_rasterize);
#[cfg(not(feature = "png"))]
criterion_group!(benches, bench_build, bench_render);
criterion_main!(benches);
