use accord_matching::alignment::align;
use accord_matching::body::compare_documents;
use accord_matching::{
    Category, DocPath, MatchingContext, MatchingRule, MatchingRuleCategory, Mismatch, MismatchKind,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::{json, Value};

fn reversed(n: usize) -> (Vec<u64>, Vec<u64>) {
    let expected: Vec<u64> = (0..n as u64).collect();
    let actual: Vec<u64> = expected.iter().rev().copied().collect();
    (expected, actual)
}

fn items(n: usize, reverse: bool) -> Value {
    let mut ids: Vec<usize> = (0..n).collect();
    if reverse {
        ids.reverse();
    }
    Value::Array(
        ids.into_iter()
            .map(|id| json!({"id": id, "name": format!("item-{id}"), "tags": ["a", "b"]}))
            .collect(),
    )
}

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");

    for size in [4, 8, 12, 16] {
        let (expected, actual) = reversed(size);
        group.bench_with_input(BenchmarkId::new("reversed", size), &size, |b, _| {
            b.iter(|| {
                align(expected.len(), actual.len(), |e, a| {
                    if expected[e] == actual[a] {
                        Vec::new()
                    } else {
                        vec![Mismatch::new(
                            MismatchKind::Body,
                            DocPath::root().index(a),
                            expected[e].to_string(),
                            actual[a].to_string(),
                            "different",
                        )]
                    }
                })
            })
        });
    }

    group.finish();
}

fn bench_unordered_documents(c: &mut Criterion) {
    let mut group = c.benchmark_group("unordered_documents");
    let rules = MatchingRuleCategory::new(Category::Body)
        .with_rule("$.items", MatchingRule::EqualsIgnoreOrder { min: None, max: None })
        .unwrap_or_else(|_| MatchingRuleCategory::new(Category::Body));
    let ctx = MatchingContext::new(&rules, MismatchKind::Body);

    for size in [4, 8, 12] {
        let expected = json!({ "items": items(size, false) });
        let actual = json!({ "items": items(size, true) });
        group.bench_with_input(BenchmarkId::new("ignore_order", size), &size, |b, _| {
            b.iter(|| compare_documents(black_box(&expected), black_box(&actual), &ctx))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_align, bench_unordered_documents);
criterion_main!(benches);
