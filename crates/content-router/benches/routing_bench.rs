//! 条件树评估性能基准测试
//!
//! 针对叶子条件评估和不同形态条件树的遍历做细粒度性能测试。

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use std::hint::black_box;

use content_router::{
    ComparisonOperator, Condition, ConditionGroup, ConditionNode, ContentType,
    EvaluatorRegistry, InMemoryRuleStore, MediaItem, RoutingContext, RoutingEvaluator,
    TreeEvaluator, evaluators,
};

fn bench_item() -> MediaItem {
    MediaItem::new(
        "Interstellar",
        ContentType::Movie,
        json!({
            "certification": "PG-13",
            "genres": ["sci-fi", "drama", "adventure"],
            "originalLanguage": "en",
            "year": 2014
        }),
    )
}

fn bench_registry() -> EvaluatorRegistry {
    let mut registry = EvaluatorRegistry::new();
    evaluators::register_builtin(&mut registry, Arc::new(InMemoryRuleStore::new()));
    registry
}

/// 叶子条件评估基准
fn bench_leaf_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("leaf_evaluation");

    let store: Arc<InMemoryRuleStore> = Arc::new(InMemoryRuleStore::new());
    let certification = evaluators::CertificationEvaluator::new(store.clone());
    let genre = evaluators::GenreEvaluator::new(store);

    let item = bench_item();
    let context = RoutingContext::new(ContentType::Movie);

    let eq_condition = Condition::new("certification", ComparisonOperator::Equals, "PG-13");
    group.bench_function("certification_equals", |b| {
        b.iter(|| {
            certification.evaluate_condition(
                black_box(&eq_condition),
                black_box(&item),
                black_box(&context),
            )
        })
    });

    let in_condition = Condition::new(
        "certification",
        ComparisonOperator::In,
        vec!["G", "PG", "PG-13", "R"],
    );
    group.bench_function("certification_in", |b| {
        b.iter(|| {
            certification.evaluate_condition(
                black_box(&in_condition),
                black_box(&item),
                black_box(&context),
            )
        })
    });

    let regex_condition = Condition::new("genre", ComparisonOperator::Regex, "^sci.*");
    group.bench_function("genre_regex", |b| {
        b.iter(|| {
            genre.evaluate_condition(
                black_box(&regex_condition),
                black_box(&item),
                black_box(&context),
            )
        })
    });

    group.finish();
}

/// 构造 n 个叶子的扁平 AND 树
fn flat_and_tree(n: usize) -> ConditionNode {
    let leaves = (0..n)
        .map(|_| {
            ConditionNode::condition(Condition::new(
                "certification",
                ComparisonOperator::Equals,
                "PG-13",
            ))
        })
        .collect();
    ConditionNode::group(ConditionGroup::and(leaves))
}

/// 构造嵌套 n 层的链式树
fn nested_tree(n: usize) -> ConditionNode {
    let mut node = ConditionNode::condition(Condition::new(
        "certification",
        ComparisonOperator::Equals,
        "PG-13",
    ));
    for _ in 0..n {
        node = ConditionNode::group(ConditionGroup::and(vec![node]));
    }
    node
}

/// 条件树遍历基准
fn bench_tree_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_evaluation");

    let registry = bench_registry();
    let evaluator = TreeEvaluator::new();
    let item = bench_item();
    let context = RoutingContext::new(ContentType::Movie);

    for width in [1usize, 8, 32] {
        let tree = flat_and_tree(width);
        group.bench_with_input(BenchmarkId::new("flat_and", width), &tree, |b, tree| {
            b.iter(|| {
                evaluator.evaluate(
                    black_box(tree),
                    black_box(&item),
                    black_box(&context),
                    black_box(&registry),
                )
            })
        });
    }

    for depth in [4usize, 12, 20] {
        let tree = nested_tree(depth);
        group.bench_with_input(BenchmarkId::new("nested", depth), &tree, |b, tree| {
            b.iter(|| {
                evaluator.evaluate(
                    black_box(tree),
                    black_box(&item),
                    black_box(&context),
                    black_box(&registry),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_leaf_evaluation, bench_tree_evaluation);
criterion_main!(benches);
