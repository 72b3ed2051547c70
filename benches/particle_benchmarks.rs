//! Benchmarks for particle simulation and rendering

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use healthy_smile_lab::{
    config::ParticleConfig,
    geometry::{Point, Rect},
    particles::ParticleSystem,
};
use image::RgbaImage;

fn mouth_contour(count: usize) -> Vec<Point> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32 * std::f32::consts::TAU;
            Point::new(320.0 + 30.0 * t.cos(), 340.0 + 12.0 * t.sin())
        })
        .collect()
}

/// A system in steady state: one burst per frame for a full particle lifetime
fn saturated_system(burst: usize) -> ParticleSystem {
    let mut system = ParticleSystem::with_seed(ParticleConfig::default(), 17);
    let video = Rect::from_size(640, 480);
    let origins = mouth_contour(burst);
    for _ in 0..85 {
        system.emit(&origins, &video, &video);
        system.advance();
        system.cull();
    }
    system
}

fn benchmark_particles(c: &mut Criterion) {
    let mut group = c.benchmark_group("particles");
    let video = Rect::from_size(640, 480);
    let display = Rect::new(320.0, 150.0, 640.0, 480.0);

    for burst in [12usize, 18] {
        let origins = mouth_contour(burst);

        group.bench_with_input(BenchmarkId::new("emit", burst), &origins, |b, origins| {
            let mut system = ParticleSystem::with_seed(ParticleConfig::default(), 1);
            b.iter(|| {
                system.clear();
                system.emit(black_box(origins), &video, &display);
            });
        });

        group.bench_with_input(BenchmarkId::new("advance_saturated", burst), &burst, |b, &burst| {
            let mut system = saturated_system(burst);
            b.iter(|| {
                system.advance();
                black_box(system.len())
            });
        });

        group.bench_with_input(BenchmarkId::new("render_saturated", burst), &burst, |b, &burst| {
            let system = saturated_system(burst);
            let mut canvas = RgbaImage::new(1280, 720);
            b.iter(|| system.render(black_box(&mut canvas)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_particles);
criterion_main!(benches);
