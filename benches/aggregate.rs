//! Benchmarks for fragment aggregation.
//!
//! Covers the two hot paths of a run: computing composite sort keys and
//! concatenating a target's fragments in numeric and alpha order.

use concat_fragments::aggregate::{compare_keys, sort_key, Aggregator};
use concat_fragments::filesystem::MemoryFS;
use concat_fragments::fragment::{Fragment, FragmentBody};
use concat_fragments::target::OrderMode;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Builds `count` fragments with orders spread across the numeric range,
/// a quarter of them pulling their body from a source file.
fn create_fragments(count: usize) -> (MemoryFS, Vec<Fragment>) {
    let mut fs = MemoryFS::new();
    let mut fragments = Vec::with_capacity(count);

    for i in 0..count {
        let name = format!("fragment-{}", i);
        let order = format!("{:03}", (i * 7919) % 1000);
        let fragment = if i % 4 == 0 {
            let source = format!("files/part{}.txt", i);
            fs.insert(source.clone(), "line from a source file");
            Fragment::new(&name, "/etc/motd", FragmentBody::Source(vec![source])).unwrap()
        } else {
            Fragment::with_content(&name, "/etc/motd", format!("line {}\n", i)).unwrap()
        };
        fragments.push(fragment.with_order(order).unwrap());
    }

    (fs, fragments)
}

fn bench_sort_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_key");

    group.bench_function("numeric_compare", |b| {
        let a = sort_key("10", "tail", OrderMode::Numeric);
        let z = sort_key("9", "head", OrderMode::Numeric);
        b.iter(|| compare_keys(black_box(&a), black_box(&z), OrderMode::Numeric))
    });

    group.bench_function("alpha_compare", |b| {
        let a = sort_key("10", "tail", OrderMode::Alpha);
        let z = sort_key("9", "head", OrderMode::Alpha);
        b.iter(|| compare_keys(black_box(&a), black_box(&z), OrderMode::Alpha))
    });

    // Mixed digit and text runs force several comparisons per key
    group.bench_function("mixed_runs", |b| {
        let a = sort_key("v1.10-rc2", "pkg", OrderMode::Numeric);
        let z = sort_key("v1.9-rc10", "pkg", OrderMode::Numeric);
        b.iter(|| compare_keys(black_box(&a), black_box(&z), OrderMode::Numeric))
    });

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for count in [10, 100, 1000] {
        let (fs, fragments) = create_fragments(count);
        let refs: Vec<&Fragment> = fragments.iter().collect();
        let aggregator = Aggregator::new(&fs);

        group.bench_function(format!("numeric_{}", count), |b| {
            b.iter(|| {
                aggregator
                    .aggregate(black_box(&refs), OrderMode::Numeric, false)
                    .unwrap()
            })
        });

        group.bench_function(format!("alpha_ensure_newline_{}", count), |b| {
            b.iter(|| {
                aggregator
                    .aggregate(black_box(&refs), OrderMode::Alpha, true)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sort_keys, bench_aggregate);
criterion_main!(benches);
