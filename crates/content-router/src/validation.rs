//! 条件树结构校验
//!
//! 在规则入库时执行一次，评估路径不再重复检查。
//! 拒绝两类病态输入：嵌套超限的树，以及经共享引用构造出的非树结构
//! （同一组节点经不同父节点可达——按引用身份判定，不是结构相等）。

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Result, RouterError};
use crate::models::{Condition, ConditionGroup, ConditionNode};
use crate::operators::ComparisonOperator;

/// 条件树最大嵌套深度
pub const MAX_CONDITION_DEPTH: usize = 20;

/// 校验条件树的结构合法性（深度 + 引用循环）
///
/// 叶子条件在结构层面总是合法的；操作符与值的兼容性属于编辑层
/// 的附加校验（见 [`validate_for_authoring`]），不阻塞入库。
pub fn validate_tree(root: &ConditionNode) -> Result<()> {
    validate_tree_with_depth(root, MAX_CONDITION_DEPTH)
}

/// 同 [`validate_tree`]，但允许指定深度上限
pub fn validate_tree_with_depth(root: &ConditionNode, max_depth: usize) -> Result<()> {
    let mut visited: HashSet<*const ConditionGroup> = HashSet::new();
    validate_node(root, 0, max_depth, &mut visited, "root")
}

fn validate_node(
    node: &ConditionNode,
    depth: usize,
    max_depth: usize,
    visited: &mut HashSet<*const ConditionGroup>,
    path: &str,
) -> Result<()> {
    if depth > max_depth {
        return Err(RouterError::DepthExceeded { depth, max_depth });
    }

    match node {
        // 叶子条件在结构层面总是合法
        ConditionNode::Condition(_) => Ok(()),
        ConditionNode::Group(group) => {
            // 按引用身份去重：同一次遍历中再次遇到同一组节点即为非树结构。
            // 两个独立编写、恰好值相等的组不会触发（指针不同）。
            if !visited.insert(Arc::as_ptr(group)) {
                return Err(RouterError::CyclicReference(path.to_string()));
            }

            for (i, child) in group.conditions.iter().enumerate() {
                let child_path = format!("{}.conditions[{}]", path, i);
                validate_node(child, depth + 1, max_depth, visited, &child_path)?;
            }

            Ok(())
        }
    }
}

/// 面向规则编辑界面的严格校验
///
/// 在结构校验之上，额外要求每个条件组至少含一个条件、每个叶子
/// 填写了字段和非空值，并对操作符与值的兼容性做预检。
/// 服务端存储不套用此约束，历史入库的空组仍可正常读取和评估。
pub fn validate_for_authoring(root: &ConditionNode) -> Result<()> {
    validate_tree(root)?;
    check_authoring_node(root, "root")
}

fn check_authoring_node(node: &ConditionNode, path: &str) -> Result<()> {
    match node {
        ConditionNode::Condition(condition) => check_authoring_condition(condition, path),
        ConditionNode::Group(group) => {
            if group.conditions.is_empty() {
                return Err(RouterError::EmptyGroup(path.to_string()));
            }

            for (i, child) in group.conditions.iter().enumerate() {
                let child_path = format!("{}.conditions[{}]", path, i);
                check_authoring_node(child, &child_path)?;
            }

            Ok(())
        }
    }
}

fn check_authoring_condition(condition: &Condition, path: &str) -> Result<()> {
    if condition.field.trim().is_empty() {
        return Err(RouterError::IncompleteCondition {
            path: path.to_string(),
            reason: "字段不能为空".to_string(),
        });
    }

    if condition.value.is_empty() {
        return Err(RouterError::IncompleteCondition {
            path: path.to_string(),
            reason: "值不能为空".to_string(),
        });
    }

    check_operator_value(condition, path)
}

/// 操作符与值的兼容性预检
fn check_operator_value(condition: &Condition, path: &str) -> Result<()> {
    match condition.operator {
        ComparisonOperator::In | ComparisonOperator::NotIn => {
            if condition.value.as_string_list().is_none()
                && condition.value.as_number_list().is_none()
            {
                return Err(RouterError::IncompleteCondition {
                    path: path.to_string(),
                    reason: format!("{} 操作符需要数组值", condition.operator),
                });
            }
        }
        ComparisonOperator::Between => {
            let Some(range) = condition.value.as_range() else {
                return Err(RouterError::IncompleteCondition {
                    path: path.to_string(),
                    reason: "between 操作符需要 {min, max} 区间".to_string(),
                });
            };
            if range.min.is_none() && range.max.is_none() {
                return Err(RouterError::IncompleteCondition {
                    path: path.to_string(),
                    reason: "between 区间至少需要设置一端".to_string(),
                });
            }
        }
        ComparisonOperator::Regex => {
            let Some(pattern) = condition.value.as_str() else {
                return Err(RouterError::IncompleteCondition {
                    path: path.to_string(),
                    reason: "regex 操作符需要字符串值".to_string(),
                });
            };
            // 预验证正则表达式，避免把必然匹配失败的规则存入库
            regex::Regex::new(pattern).map_err(|e| RouterError::IncompleteCondition {
                path: path.to_string(),
                reason: format!("无效的正则表达式 '{}': {}", pattern, e),
            })?;
        }
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, ConditionGroup, ConditionNode, RangeValue};
    use crate::operators::ComparisonOperator;
    use std::sync::Arc;

    fn leaf() -> ConditionNode {
        ConditionNode::condition(Condition::new(
            "certification",
            ComparisonOperator::Equals,
            "PG",
        ))
    }

    /// 构造嵌套 n 层组、最内层放一个叶子的链
    fn nested_groups(n: usize) -> ConditionNode {
        let mut node = leaf();
        for _ in 0..n {
            node = ConditionNode::group(ConditionGroup::and(vec![node]));
        }
        node
    }

    #[test]
    fn test_depth_20_passes() {
        // 20 层组，叶子位于深度 20
        assert!(validate_tree(&nested_groups(20)).is_ok());
    }

    #[test]
    fn test_depth_21_fails() {
        let result = validate_tree(&nested_groups(21));
        assert!(matches!(
            result,
            Err(RouterError::DepthExceeded { .. })
        ));
    }

    #[test]
    fn test_custom_depth_limit() {
        assert!(validate_tree_with_depth(&nested_groups(3), 3).is_ok());
        assert!(validate_tree_with_depth(&nested_groups(4), 3).is_err());
    }

    #[test]
    fn test_shared_group_node_rejected() {
        // 同一个组节点经两个父节点可达
        let shared = Arc::new(ConditionGroup::and(vec![leaf()]));
        let root = ConditionNode::group(ConditionGroup::or(vec![
            ConditionNode::Group(shared.clone()),
            ConditionNode::Group(shared),
        ]));

        let result = validate_tree(&root);
        assert!(matches!(result, Err(RouterError::CyclicReference(_))));
    }

    #[test]
    fn test_value_equal_but_distinct_groups_pass() {
        // 两个独立构造、值完全相同的组不是同一节点，应通过
        let root = ConditionNode::group(ConditionGroup::or(vec![
            ConditionNode::group(ConditionGroup::and(vec![leaf()])),
            ConditionNode::group(ConditionGroup::and(vec![leaf()])),
        ]));

        assert!(validate_tree(&root).is_ok());
    }

    #[test]
    fn test_empty_group_passes_structural_check() {
        // 存量数据可能含空组，结构校验接受（评估时按恒等元处理）
        let root = ConditionNode::group(ConditionGroup::and(vec![]));
        assert!(validate_tree(&root).is_ok());
    }

    #[test]
    fn test_empty_group_fails_authoring_check() {
        let root = ConditionNode::group(ConditionGroup::and(vec![]));
        let result = validate_for_authoring(&root);
        assert!(matches!(result, Err(RouterError::EmptyGroup(_))));
    }

    #[test]
    fn test_blank_field_fails_authoring_check() {
        let root = ConditionNode::group(ConditionGroup::and(vec![ConditionNode::condition(
            Condition::new("  ", ComparisonOperator::Equals, "PG"),
        )]));

        let result = validate_for_authoring(&root);
        assert!(matches!(
            result,
            Err(RouterError::IncompleteCondition { .. })
        ));
    }

    #[test]
    fn test_empty_value_fails_authoring_check() {
        let root = ConditionNode::condition(Condition::new(
            "genre",
            ComparisonOperator::In,
            Vec::<&str>::new(),
        ));

        let result = validate_for_authoring(&root);
        assert!(matches!(
            result,
            Err(RouterError::IncompleteCondition { .. })
        ));
    }

    #[test]
    fn test_in_operator_requires_list() {
        let root = ConditionNode::condition(Condition::new(
            "genre",
            ComparisonOperator::In,
            "action",
        ));

        let result = validate_for_authoring(&root);
        assert!(matches!(
            result,
            Err(RouterError::IncompleteCondition { .. })
        ));
    }

    #[test]
    fn test_between_requires_bound() {
        let root = ConditionNode::condition(Condition::new(
            "year",
            ComparisonOperator::Between,
            RangeValue::default(),
        ));

        let result = validate_for_authoring(&root);
        assert!(matches!(
            result,
            Err(RouterError::IncompleteCondition { .. })
        ));

        let root = ConditionNode::condition(Condition::new(
            "year",
            ComparisonOperator::Between,
            RangeValue {
                min: Some(1990.0),
                max: None,
            },
        ));
        assert!(validate_for_authoring(&root).is_ok());
    }

    #[test]
    fn test_invalid_regex_fails_authoring_check() {
        let root = ConditionNode::condition(Condition::new(
            "genre",
            ComparisonOperator::Regex,
            "[invalid",
        ));

        let result = validate_for_authoring(&root);
        assert!(matches!(
            result,
            Err(RouterError::IncompleteCondition { .. })
        ));
    }

    #[test]
    fn test_authoring_check_runs_structural_check_first() {
        let result = validate_for_authoring(&nested_groups(21));
        assert!(matches!(
            result,
            Err(RouterError::DepthExceeded { .. })
        ));
    }
}
