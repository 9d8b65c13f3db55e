//! 评估器注册表
//!
//! 持有按优先级降序排列的评估器列表，并解析"这个字段归谁评估"。
//! 注册表构建完成后即视为只读，可被多个并发解析请求共享；
//! 运行期不增删评估器。

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::evaluator::RoutingEvaluator;

pub struct EvaluatorRegistry {
    evaluators: Vec<Arc<dyn RoutingEvaluator>>,
    /// 字段 -> 认领评估器下标（None 表示确认无人认领）
    owner_cache: DashMap<String, Option<usize>>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self {
            evaluators: Vec::new(),
            owner_cache: DashMap::new(),
        }
    }

    /// 注册一个评估器
    ///
    /// 注册顺序不影响结果：列表始终按优先级降序维护，
    /// 同优先级之间保持注册先后顺序（稳定排序）。
    pub fn register(&mut self, evaluator: Arc<dyn RoutingEvaluator>) {
        self.evaluators.push(evaluator);
        self.evaluators.sort_by_key(|e| std::cmp::Reverse(e.priority()));
        self.owner_cache.clear();
    }

    /// 按优先级降序返回评估器列表
    pub fn evaluators(&self) -> &[Arc<dyn RoutingEvaluator>] {
        &self.evaluators
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }

    /// 解析字段的归属评估器
    ///
    /// 按优先级顺序询问各启用评估器，首个认领者胜出；
    /// 结果按字段缓存，注册表的生命周期内字段归属不变。
    pub fn owner_of(&self, field: &str) -> Option<Arc<dyn RoutingEvaluator>> {
        if let Some(cached) = self.owner_cache.get(field) {
            let index = *cached;
            return index.map(|i| self.evaluators[i].clone());
        }

        let index = self
            .evaluators
            .iter()
            .position(|e| e.enabled() && e.can_evaluate_condition_field(field));

        if index.is_none() {
            debug!(field, "没有评估器认领该字段");
        }

        self.owner_cache.insert(field.to_string(), index);
        index.map(|i| self.evaluators[i].clone())
    }
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
