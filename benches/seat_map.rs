//! Seat grid generation for halls of increasing size.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use movie_reservation::models::Hall;
use movie_reservation::services::seat_map::build_seat_map;

fn hall(rows: i32, cols: i32) -> Hall {
    Hall {
        id: 1,
        name: "Bench".into(),
        seat_count: rows * cols,
        rows,
        cols,
    }
}

fn bench_build_seat_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_seat_map");
    for (rows, cols) in [(10, 12), (25, 40), (100, 100)] {
        let hall = hall(rows, cols);
        group.throughput(Throughput::Elements((rows * cols) as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{rows}x{cols}")),
            &hall,
            |b, hall| b.iter(|| build_seat_map(black_box(hall))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_build_seat_map);
criterion_main!(benches);
