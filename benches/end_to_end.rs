//! End-to-end generation benchmark.
//!
//! Measures each stage on synthetic manifests of growing size:
//! 1. Manifest parsing + validation
//! 2. Planning
//! 3. C emission
//! 4. Total end-to-end

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use hostgen::manifest::parse_manifest;
use hostgen::plan::Plan;

/// Build a manifest with `kernels` kernels spread over four tiers, each
/// with two inputs, one validated output and a scratch buffer.
fn synthetic_manifest(kernels: usize) -> String {
    let mut xml = String::from(r#"<kernels program="bench.aocx" preamble="yes" profile="yes">"#);
    for k in 0..kernels {
        xml.push_str(&format!(
            r#"<kernel name="k{k}" order="{tier}">
    <input name="a{k}" type="float" nmemb="1024" arg="0" generator="fill"/>
    <input name="n{k}" type="int" nmemb="1" arg="1">1024</input>
    <output name="o{k}" type="cl_float4" nmemb="256" arg="2" epsilon="0.001" generator="expect"/>
    <local type="float" nmemb="64" arg="3"/>
    <ndrange dim="1"><global>1024</global><local>64</local></ndrange>
</kernel>"#,
            k = k,
            tier = k % 4
        ));
    }
    xml.push_str("</kernels>");
    xml
}

fn bench_parse(c: &mut Criterion) {
    let small = synthetic_manifest(4);
    let large = synthetic_manifest(64);

    let mut group = c.benchmark_group("parse");
    group.bench_function("4_kernels", |b| b.iter(|| parse_manifest(black_box(&small))));
    group.bench_function("64_kernels", |b| b.iter(|| parse_manifest(black_box(&large))));
    group.finish();
}

fn bench_plan(c: &mut Criterion) {
    let manifest = match parse_manifest(&synthetic_manifest(64)) {
        Ok(m) => m,
        Err(_) => panic!("synthetic manifest should parse"),
    };

    c.bench_function("plan/64_kernels", |b| {
        b.iter(|| Plan::build(black_box(&manifest)))
    });
}

fn bench_emit(c: &mut Criterion) {
    let manifest = match parse_manifest(&synthetic_manifest(64)) {
        Ok(m) => m,
        Err(_) => panic!("synthetic manifest should parse"),
    };
    let plan = match Plan::build(&manifest) {
        Ok(p) => p,
        Err(_) => panic!("synthetic manifest should plan"),
    };

    c.bench_function("emit/64_kernels", |b| {
        b.iter(|| hostgen::emit::emit(black_box(&manifest), black_box(&plan)))
    });
}

fn bench_end_to_end(c: &mut Criterion) {
    let source = synthetic_manifest(16);

    c.bench_function("end_to_end/16_kernels", |b| {
        b.iter(|| hostgen::generate_silent(black_box(&source)))
    });
}

criterion_group!(benches, bench_parse, bench_plan, bench_emit, bench_end_to_end);
criterion_main!(benches);
