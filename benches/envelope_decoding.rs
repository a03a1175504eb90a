//! Benchmarks for gateway response and event frame decoding
//!
//! This benchmark measures:
//! - Response envelope decoding for success, error and empty bodies
//! - Event frame parsing, including frames that are dropped as malformed

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use contract_gateway_client::{ContractEvent, ResponseEnvelope};

const CONSTANT_RESULT: &str = r#"{"balance":"1000000000000000000","decimals":18,"symbol":"TOK"}"#;
const STATUS_RESULT: &str = r#"{"callId":"c-42","status":"Successful","isSuccessful":true,"blockNumber":1234567}"#;
const ERROR_RESULT: &str = r#"{"error":{"message":"function transfer not found","code":404}}"#;

const TRANSFER_FRAME: &str = r#"{"name":"Transfer","params":{"from":"0xcd92C45083aB059B1e5Af91c7cE58adf9D199e3c","to":"0x73426F686Db8e511310a9fb90F9B22DB71ed53D4","value":"100"}}"#;
const MALFORMED_FRAME: &str = r#"{"params":{"value":"100"}"#;

fn large_event_frame(params: usize) -> String {
    let fields: Vec<String> = (0..params)
        .map(|i| format!(r#""field{}":"0x{:040x}""#, i, i))
        .collect();
    format!(r#"{{"name":"Batch","params":{{{}}}}}"#, fields.join(","))
}

fn bench_envelope_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_decoding");

    for (name, status, body) in [
        ("constant", 200u16, CONSTANT_RESULT),
        ("status", 200, STATUS_RESULT),
        ("error", 404, ERROR_RESULT),
        ("empty", 204, ""),
    ] {
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::new("from_status", name), &body, |b, body| {
            b.iter(|| ResponseEnvelope::from_status(black_box(status), black_box(body)))
        });
    }

    group.bench_function("error_message", |b| {
        let envelope = ResponseEnvelope::from_status(404, ERROR_RESULT).ok();
        b.iter(|| envelope.as_ref().and_then(|e| black_box(e).error_message()))
    });

    group.finish();
}

fn bench_event_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_frames");

    group.bench_function("transfer", |b| {
        b.iter(|| ContractEvent::from_frame(black_box(TRANSFER_FRAME)))
    });
    group.bench_function("malformed", |b| {
        b.iter(|| ContractEvent::from_frame(black_box(MALFORMED_FRAME)))
    });

    for params in [8usize, 64, 512] {
        let frame = large_event_frame(params);
        group.throughput(Throughput::Bytes(frame.len() as u64));
        group.bench_with_input(BenchmarkId::new("params", params), &frame, |b, frame| {
            b.iter(|| ContractEvent::from_frame(black_box(frame)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_envelope_decoding, bench_event_frames);
criterion_main!(benches);
