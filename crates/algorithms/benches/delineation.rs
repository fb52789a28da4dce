//! Benchmarks for basin delineation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::{Coord, Point};
use ottobasin_algorithms::hydrology::{find_basin, FindBasinParams};
use ottobasin_algorithms::vector::{cascaded_union, repair_polygon};
use ottobasin_core::{AttributeValue, MemorySource, Shape, ShapeRecord};

/// Square grid of unit catchments along one reach, codes increasing
/// row-major so an outlet in the first row drains almost the whole grid
fn create_grid_layer(size: usize) -> MemorySource {
    let fields = vec![
        "cocursodag".to_string(),
        "cobacia".to_string(),
        "nuareacont".to_string(),
    ];
    let records = (0..size * size)
        .map(|i| {
            let (x, y) = ((i % size) as f64, (i / size) as f64);
            let ring = vec![
                Coord { x, y },
                Coord { x: x + 1.0, y },
                Coord { x: x + 1.0, y: y + 1.0 },
                Coord { x, y: y + 1.0 },
                Coord { x, y },
            ];
            ShapeRecord::new(
                Shape::from_rings(vec![ring]),
                vec![
                    AttributeValue::from("76"),
                    AttributeValue::from(format!("{:08}", 10_000_000 + i)),
                    AttributeValue::from("1,0"),
                ],
            )
        })
        .collect();
    MemorySource::from_records(fields, records).unwrap()
}

fn bench_find_basin(c: &mut Criterion) {
    let mut group = c.benchmark_group("hydrology/find_basin");
    group.sample_size(10);
    for size in [8, 16, 32] {
        let layer = create_grid_layer(size);
        let params = FindBasinParams {
            area_field: Some("nuareacont".to_string()),
            ..Default::default()
        };
        let outlet = Point::new(size as f64 / 2.0 + 0.5, 0.5);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| find_basin(black_box(&layer), &outlet, &params, None).unwrap())
        });
    }
    group.finish();
}

fn bench_cascaded_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector/cascaded_union");
    group.sample_size(10);
    for size in [8, 16, 32] {
        let layer = create_grid_layer(size);
        let polygons: Vec<_> = layer
            .iter()
            .map(|r| {
                let ring = geo::LineString::from(r.shape.points.clone());
                repair_polygon(&geo::Polygon::new(ring, vec![]))
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| cascaded_union(black_box(polygons.clone())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_find_basin, bench_cascaded_union);
criterion_main!(benches);
