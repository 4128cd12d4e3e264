//! Criterion benchmarks for the line-parsing hot path.
//!
//! Every byte burst from the meter goes through framing and one adapter's
//! `parse_line`, so these establish baselines for the per-line cost across
//! adapters and input shapes.
//!
//! Run with: cargo bench --bench parse

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ec_daq::acquisition::LineFramer;
use ec_daq::adapters::{Con150Adapter, MeterAdapter, Mw301Adapter, Sension7Adapter};

/// Benchmark each adapter against the line shapes it sees in practice:
/// a full reading, a unit-only reading, and junk that has to be rejected.
fn adapter_parse_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("adapter_parse_line");

    let adapters: Vec<(&str, Box<dyn MeterAdapter>)> = vec![
        ("sension7", Box::new(Sension7Adapter)),
        ("con150", Box::new(Con150Adapter)),
        ("mw301", Box::new(Mw301Adapter)),
    ];

    let lines = vec![
        ("full", "COND: 1413.5 uS/cm TEMP: 25.0 C"),
        ("unit_only", "1413.5 uS/cm"),
        ("micro_sign", "1413.5 µS/cm"),
        ("garbage", "ERR E2 CHECK PROBE"),
    ];

    for (adapter_name, adapter) in &adapters {
        for (line_name, line) in &lines {
            group.bench_with_input(
                BenchmarkId::new(*adapter_name, line_name),
                line,
                |b, line| {
                    b.iter(|| {
                        let reading = adapter.parse_line(black_box(line));
                        black_box(reading);
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark framing a realistic burst: several CRLF-terminated readings
/// arriving as one chunk, drained line by line.
fn framer_burst(c: &mut Criterion) {
    let burst: Vec<u8> = (0..16)
        .flat_map(|i| format!("{}.{} uS/cm 25.0 C\r\n", 1000 + i, i).into_bytes())
        .collect();

    c.bench_function("framer_burst_16_lines", |b| {
        b.iter(|| {
            let mut framer = LineFramer::new(4096);
            framer.push(black_box(&burst));
            while let Some(line) = framer.next_line() {
                black_box(line);
            }
        });
    });
}

criterion_group!(benches, adapter_parse_line, framer_burst);
criterion_main!(benches);
