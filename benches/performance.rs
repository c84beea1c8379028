//! Performance benchmarks for the frequency sweep tester
//!
//! Covers the hot paths of a bandwidth test: framing sentences, parsing
//! replies and normalizing the samples the device streams back.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use freq_sweep_tester::{
    gateway::codec::{decode_length, encode_sentence, Reply},
    models::{BandwidthSample, FrequencyResult, QualificationOutcome},
    output::{JsonFormatter, ReportContext, ReportFormatter, TableFormatter},
};
use std::collections::BTreeMap;

/// One `!re` reply as emitted once per second by a bandwidth test
fn sample_reply_words() -> Vec<String> {
    [
        "!re",
        "=status=running",
        "=duration=7s",
        "=tx-current=48213504",
        "=tx-10-second-average=47185920",
        "=tx-total-average=46137344",
        "=rx-current=21495808",
        "=rx-10-second-average=20971520",
        "=rx-total-average=20447232",
        "=lost-packets=0",
        "=random-data=false",
        "=direction=both",
        "=connection-count=20",
        "=local-cpu-load=14%",
        "=remote-cpu-load=38%",
        "=.section=6",
    ]
    .iter()
    .map(|word| word.to_string())
    .collect()
}

fn raw_samples(count: usize) -> Vec<BTreeMap<String, String>> {
    let reply = Reply::parse(&sample_reply_words()).unwrap();
    (0..count).map(|_| reply.attributes.clone()).collect()
}

fn bench_codec(c: &mut Criterion) {
    let words = sample_reply_words();
    let encoded = encode_sentence(&words);

    c.bench_function("encode_sentence", |b| b.iter(|| encode_sentence(black_box(&words))));

    c.bench_function("decode_lengths", |b| {
        b.iter(|| {
            let mut offset = 0;
            while let Ok(Some((len, prefix))) = decode_length(black_box(&encoded[offset..])) {
                if len == 0 {
                    break;
                }
                offset += prefix + len;
            }
            offset
        })
    });

    c.bench_function("parse_reply", |b| b.iter(|| Reply::parse(black_box(&words)).unwrap()));
}

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize_samples");
    for count in [10usize, 60, 600] {
        let raw = raw_samples(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &raw, |b, raw| {
            b.iter(|| {
                raw.iter()
                    .map(|record| BandwidthSample::from_raw(record).normalized())
                    .collect::<Vec<_>>()
            })
        });
    }
    group.finish();
}

fn bench_report_formatting(c: &mut Criterion) {
    let samples: Vec<BandwidthSample> = raw_samples(60)
        .iter()
        .map(|record| BandwidthSample::from_raw(record).normalized())
        .collect();
    let result = FrequencyResult::tested(
        5180,
        QualificationOutcome::evaluate(Some(-58), 2.4, -70, 15.0),
        samples,
    );
    let context = ReportContext {
        ap_address: "192.168.88.1".parse().unwrap(),
        station_address: "192.168.88.2".parse().unwrap(),
    };

    c.bench_function("format_table_record", |b| {
        let formatter = TableFormatter::new();
        b.iter(|| formatter.format_record(black_box(&result), &context).unwrap())
    });
    c.bench_function("format_json_record", |b| {
        let formatter = JsonFormatter::new();
        b.iter(|| formatter.format_record(black_box(&result), &context).unwrap())
    });
}

criterion_group!(benches, bench_codec, bench_normalization, bench_report_formatting);
criterion_main!(benches);
