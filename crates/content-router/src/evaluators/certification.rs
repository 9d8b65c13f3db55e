//! 分级评估器
//!
//! 认领 `certification` 字段，按内容分级（如 PG、PG-13、R）路由。
//! 比较前双方都归一化为大写。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::evaluator::RoutingEvaluator;
use crate::metadata::{FieldInfo, OperatorInfo};
use crate::models::{
    Condition, ConditionValue, MediaItem, RoutingContext, RoutingDecision,
};
use crate::operators::ComparisonOperator;
use crate::store::RuleStoreAdapter;

const FIELD: &str = "certification";

pub struct CertificationEvaluator {
    store: Arc<dyn RuleStoreAdapter>,
}

impl CertificationEvaluator {
    pub fn new(store: Arc<dyn RuleStoreAdapter>) -> Self {
        Self { store }
    }

    /// 条目的分级，归一化为大写；缺失或空白视为无分级
    fn certification_of(item: &MediaItem) -> Option<String> {
        item.metadata_field(FIELD)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
    }

    fn matches_criteria(value: &ConditionValue, certification: &str) -> bool {
        match value {
            ConditionValue::String(s) => s.eq_ignore_ascii_case(certification),
            ConditionValue::StringList(list) => {
                list.iter().any(|s| s.eq_ignore_ascii_case(certification))
            }
            other => {
                debug!(
                    value_type = other.type_name(),
                    "certification criteria 值类型不支持"
                );
                false
            }
        }
    }
}

#[async_trait]
impl RoutingEvaluator for CertificationEvaluator {
    fn name(&self) -> &str {
        "certification-router"
    }

    fn description(&self) -> &str {
        "按内容分级路由"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn supported_fields(&self) -> Vec<FieldInfo> {
        vec![FieldInfo::new(
            FIELD,
            "内容分级（如 PG、PG-13、R）",
            &["string", "string[]"],
        )]
    }

    fn supported_operators(&self) -> HashMap<String, Vec<OperatorInfo>> {
        HashMap::from([(
            FIELD.to_string(),
            vec![
                OperatorInfo::new(ComparisonOperator::Equals, "分级等于（忽略大小写）", &["string"]),
                OperatorInfo::new(ComparisonOperator::NotEquals, "分级不等于", &["string"]),
                OperatorInfo::new(ComparisonOperator::Contains, "分级包含子串", &["string"]),
                OperatorInfo::new(ComparisonOperator::In, "分级在列表中", &["string[]"]),
                OperatorInfo::new(ComparisonOperator::NotIn, "分级不在列表中", &["string[]"]),
            ],
        )])
    }

    fn can_evaluate(&self, item: &MediaItem, _context: &RoutingContext) -> bool {
        Self::certification_of(item).is_some()
    }

    async fn evaluate_routing(
        &self,
        item: &MediaItem,
        context: &RoutingContext,
    ) -> Result<Option<Vec<RoutingDecision>>> {
        let Some(certification) = Self::certification_of(item) else {
            return Ok(None);
        };

        let target = context.content_type.target_type();
        let rules = self.store.get_rules_by_type(FIELD).await?;

        let mut decisions = Vec::new();
        for rule in rules {
            if rule.target_type != target {
                continue;
            }
            if rule.condition.is_some() {
                debug!(rule_id = rule.id, "旧式规则同时携带条件树，交由通用路径处理");
                continue;
            }
            let Some(value) = rule.criteria.as_ref().and_then(|c| c.get(FIELD)) else {
                continue;
            };
            if Self::matches_criteria(value, &certification) {
                decisions.push(rule.to_decision());
            }
        }

        Ok(Some(decisions))
    }

    fn can_evaluate_condition_field(&self, field: &str) -> bool {
        field == FIELD
    }

    fn evaluate_condition(
        &self,
        condition: &Condition,
        item: &MediaItem,
        _context: &RoutingContext,
    ) -> bool {
        let Some(certification) = Self::certification_of(item) else {
            return false;
        };

        match condition.operator {
            ComparisonOperator::Equals => condition
                .value
                .as_str()
                .map(|s| s.eq_ignore_ascii_case(&certification))
                .unwrap_or(false),
            ComparisonOperator::NotEquals => condition
                .value
                .as_str()
                .map(|s| !s.eq_ignore_ascii_case(&certification))
                .unwrap_or(false),
            ComparisonOperator::Contains => condition
                .value
                .as_str()
                .map(|s| certification.contains(&s.to_uppercase()))
                .unwrap_or(false),
            ComparisonOperator::In => match &condition.value {
                ConditionValue::StringList(list) => {
                    list.iter().any(|s| s.eq_ignore_ascii_case(&certification))
                }
                other => {
                    debug!(value_type = other.type_name(), "in 操作符需要字符串数组");
                    false
                }
            },
            ComparisonOperator::NotIn => match &condition.value {
                ConditionValue::StringList(list) => {
                    !list.iter().any(|s| s.eq_ignore_ascii_case(&certification))
                }
                other => {
                    debug!(value_type = other.type_name(), "notIn 操作符需要字符串数组");
                    false
                }
            },
            op => {
                debug!(operator = %op, "certification 不支持该操作符");
                false
            }
        }
    }
}
