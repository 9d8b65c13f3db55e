//! 条件树评估器
//!
//! 递归遍历 Condition/ConditionGroup 树：叶子分发给注册表认领的评估器，
//! 组节点按 AND/OR 语义合并子结果，negate 在基础结果之上取反。
//! 评估是全函数——任何结构合法的树都产生布尔值，单个坏叶子
//! 不会中断整棵树或其他规则的评估。

use tracing::{debug, warn};

use crate::models::{Condition, ConditionGroup, ConditionNode, MediaItem, RoutingContext};
use crate::operators::LogicalOperator;
use crate::registry::EvaluatorRegistry;
use crate::validation::MAX_CONDITION_DEPTH;

/// 条件树评估器
///
/// 深度/循环防御在入库校验时完成（validation 模块），这里不重复；
/// 但仍带递归预算：直接改库绕过校验写入的超深树最多评估到预算深度，
/// 超出部分按不匹配处理而不是栈溢出。
pub struct TreeEvaluator;

impl TreeEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// 评估条件树
    pub fn evaluate(
        &self,
        node: &ConditionNode,
        item: &MediaItem,
        context: &RoutingContext,
        registry: &EvaluatorRegistry,
    ) -> bool {
        self.evaluate_node(node, item, context, registry, 0)
    }

    fn evaluate_node(
        &self,
        node: &ConditionNode,
        item: &MediaItem,
        context: &RoutingContext,
        registry: &EvaluatorRegistry,
        depth: usize,
    ) -> bool {
        if depth > MAX_CONDITION_DEPTH {
            warn!(depth, "条件树超出评估深度预算，按不匹配处理");
            return false;
        }

        match node {
            ConditionNode::Condition(condition) => {
                self.evaluate_leaf(condition, item, context, registry)
            }
            ConditionNode::Group(group) => {
                self.evaluate_group(group, item, context, registry, depth)
            }
        }
    }

    fn evaluate_leaf(
        &self,
        condition: &Condition,
        item: &MediaItem,
        context: &RoutingContext,
        registry: &EvaluatorRegistry,
    ) -> bool {
        let base = match registry.owner_of(&condition.field) {
            Some(owner) => owner.evaluate_condition(condition, item, context),
            None => {
                debug!(field = %condition.field, "字段无认领评估器，按不匹配处理");
                false
            }
        };

        if condition.negate { !base } else { base }
    }

    fn evaluate_group(
        &self,
        group: &ConditionGroup,
        item: &MediaItem,
        context: &RoutingContext,
        registry: &EvaluatorRegistry,
        depth: usize,
    ) -> bool {
        // 空组取恒等元：AND 为 true，OR 为 false。
        // all/any 自带短路；评估器是只读的，短路不改变可观察结果。
        let base = match group.operator {
            LogicalOperator::And => group
                .conditions
                .iter()
                .all(|child| self.evaluate_node(child, item, context, registry, depth + 1)),
            LogicalOperator::Or => group
                .conditions
                .iter()
                .any(|child| self.evaluate_node(child, item, context, registry, depth + 1)),
        };

        if group.negate { !base } else { base }
    }
}

impl Default for TreeEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
