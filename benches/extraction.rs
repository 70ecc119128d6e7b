//! Benchmarks for tower extraction.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::cast_precision_loss)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use xltower::{preflight, CarrierMatcher, CellValue, Extractor, Sheet};

const CARRIERS: [&str; 6] = [
    "Lexington Insurance Company",
    "Chubb Bermuda",
    "Beazley Insurance",
    "Arch Specialty Insurance",
    "Swiss Re Corporate Solutions",
    "Everest Indemnity",
];

/// A tower of `layers` layers, each with a label column and a row of
/// carriers, participations and premiums.
fn generated_tower(layers: u32) -> Sheet {
    let mut sheet = Sheet::new("Tower");
    sheet.set("H1", "Layer Bound Premium").expect("valid ref");
    for layer in 0..layers {
        let top = layer * 6 + 2;
        let limit = f64::from(10 + layer * 5) * 1_000_000.0;
        sheet.set_value(top, 1, limit.into());
        sheet.set_value(top, 2, "Carrier".into());
        sheet.set_value(top + 1, 2, "Participation".into());
        sheet.set_value(top + 2, 2, "Premium".into());
        sheet.set_value(top + 3, 2, "Terms".into());
        for (i, name) in (3u32..).zip(CARRIERS) {
            sheet.set_value(top, i, name.into());
            sheet.set_value(top + 1, i, (1.0 / CARRIERS.len() as f64).into());
            sheet.set_value(top + 2, i, f64::from(25_000 + i * 1_000).into());
            sheet.set_value(top + 3, i, "Excl. Flood".into());
            sheet.set_fill_at(top, i, "FFFFFF00");
        }
        sheet.set_value(top + 2, 8, CellValue::Number(450_000.0));
    }
    sheet
}

fn bench_extract(c: &mut Criterion) {
    let extractor = Extractor::new(CarrierMatcher::bundled());
    let mut group = c.benchmark_group("extract");
    for layers in [5u32, 50, 500] {
        let sheet = generated_tower(layers);
        group.throughput(Throughput::Elements(u64::from(layers)));
        group.bench_with_input(BenchmarkId::from_parameter(layers), &sheet, |b, sheet| {
            b.iter(|| extractor.extract(black_box(sheet)));
        });
    }
    group.finish();
}

fn bench_preflight(c: &mut Criterion) {
    let matcher = CarrierMatcher::bundled();
    let sheet = generated_tower(50);
    c.bench_function("preflight_50_layers", |b| {
        b.iter(|| preflight(black_box(&sheet), &matcher));
    });
}

fn bench_match_carrier(c: &mut Criterion) {
    let matcher = CarrierMatcher::bundled();
    c.bench_function("match_carrier", |b| {
        b.iter(|| {
            for name in CARRIERS {
                black_box(matcher.match_carrier(black_box(name), "carrier"));
            }
        });
    });
}

criterion_group!(benches, bench_extract, bench_preflight, bench_match_carrier);
criterion_main!(benches);
