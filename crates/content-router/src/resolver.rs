//! 路由解析器
//!
//! 路由引擎的编排入口：给定内容条目和请求上下文，同时驱动
//! 旧式评估器路径与通用条件树路径，产出按权重降序的路由决策列表。
//! 多条规则可以同时匹配——引擎回答"哪些规则匹配、权重几何"，
//! 单目标还是多目标分发由调用方裁决。

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, instrument, warn};

use watchlist_shared::config::RouterConfig;

use crate::models::{MediaItem, RouterRule, RoutingContext, RoutingDecision};
use crate::registry::EvaluatorRegistry;
use crate::tree::TreeEvaluator;

pub struct RoutingResolver {
    registry: Arc<EvaluatorRegistry>,
    tree: TreeEvaluator,
    config: RouterConfig,
}

impl RoutingResolver {
    pub fn new(registry: Arc<EvaluatorRegistry>) -> Self {
        Self::with_config(registry, RouterConfig::default())
    }

    pub fn with_config(registry: Arc<EvaluatorRegistry>, config: RouterConfig) -> Self {
        Self {
            registry,
            tree: TreeEvaluator::new(),
            config,
        }
    }

    pub fn registry(&self) -> &EvaluatorRegistry {
        &self.registry
    }

    /// 解析路由
    ///
    /// 返回所有匹配规则产生的决策，权重降序排列，同权重维持规则
    /// 存储顺序（稳定排序）。无匹配返回空列表——这是正常结果，
    /// 表示交由调用方回退到默认目标，不是错误。
    #[instrument(skip(self, item, context, rules), fields(title = %item.title, content_type = ?item.content_type))]
    pub async fn resolve(
        &self,
        item: &MediaItem,
        context: &RoutingContext,
        rules: &[RouterRule],
    ) -> Vec<RoutingDecision> {
        if !self.config.enabled {
            debug!("路由引擎已禁用，返回空结果");
            return Vec::new();
        }

        let mut decisions = Vec::new();

        // 旧式路径：每个启用的评估器在一次解析中至多被调用一次，
        // 各自独立拉取并匹配自己类别的 criteria 规则；评估器之间无共享
        // 可变状态，并发执行
        let legacy_futures: Vec<_> = self
            .registry
            .evaluators()
            .iter()
            .filter(|e| e.enabled() && e.can_evaluate(item, context))
            .cloned()
            .map(|evaluator| async move {
                let name = evaluator.name().to_string();
                let outcome = evaluator.evaluate_routing(item, context).await;
                (name, outcome)
            })
            .collect();

        for (name, outcome) in join_all(legacy_futures).await {
            match outcome {
                Ok(Some(found)) => {
                    debug!(evaluator = %name, count = found.len(), "评估器完成旧式匹配");
                    decisions.extend(found);
                }
                Ok(None) => debug!(evaluator = %name, "评估器弃权"),
                // 单个评估器的数据源故障只影响它自己的贡献，
                // 其余评估器和规则照常参与聚合
                Err(e) => warn!(evaluator = %name, error = %e, "评估器路由失败，跳过其贡献"),
            }
        }

        // 通用路径：条件树规则
        if rules.len() > self.config.max_rules_per_resolution {
            warn!(
                total = rules.len(),
                limit = self.config.max_rules_per_resolution,
                "规则数超出单次解析上限，超出部分跳过"
            );
        }

        let target = context.content_type.target_type();
        for rule in rules.iter().take(self.config.max_rules_per_resolution) {
            if !rule.enabled || rule.target_type != target {
                continue;
            }

            let Some(condition) = &rule.condition else {
                // 纯 criteria 规则由旧式路径处理
                continue;
            };

            if rule.criteria.is_some() {
                debug!(
                    rule_id = rule.id,
                    "规则同时携带 criteria 与 condition，以条件树为准"
                );
            }

            if self.tree.evaluate(condition, item, context, &self.registry) {
                decisions.push(rule.to_decision());
            }
        }

        // 稳定排序：权重降序，同权重维持先后顺序
        decisions.sort_by(|a, b| b.weight.cmp(&a.weight));
        decisions
    }

    /// 带整体超时的解析
    ///
    /// 取消粒度是整次 resolve 调用；超时的解析返回空列表并记录告警，
    /// 对调用方等价于"无匹配"。
    pub async fn resolve_with_timeout(
        &self,
        item: &MediaItem,
        context: &RoutingContext,
        rules: &[RouterRule],
    ) -> Vec<RoutingDecision> {
        let timeout = Duration::from_millis(self.config.resolution_timeout_ms);
        match tokio::time::timeout(timeout, self.resolve(item, context, rules)).await {
            Ok(decisions) => decisions,
            Err(_) => {
                warn!(title = %item.title, timeout_ms = self.config.resolution_timeout_ms, "路由解析超时");
                Vec::new()
            }
        }
    }
}
