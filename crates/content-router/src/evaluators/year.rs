//! 年份评估器
//!
//! 认领 `year` 字段，按内容发行年份路由，
//! 覆盖数值比较和区间操作符。

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

const FIELD: &str = "year";

pub struct YearEvaluator {
    store: Arc<dyn RuleStoreAdapter>,
}

impl YearEvaluator {
    pub fn new(store: Arc<dyn RuleStoreAdapter>) -> Self {
        Self { store }
    }

    /// 条目的发行年份，接受数值或数字字符串
    fn year_of(item: &MediaItem) -> Option<f64> {
        let value = item.metadata_field(FIELD)?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
    }

    fn matches_criteria(value: &ConditionValue, year: f64) -> bool {
        match value {
            ConditionValue::Number(n) => *n == year,
            ConditionValue::NumberList(list) => list.contains(&year),
            ConditionValue::Range(range) => {
                range.min.is_none_or(|min| year >= min) && range.max.is_none_or(|max| year <= max)
            }
            other => {
                debug!(value_type = other.type_name(), "year criteria 值类型不支持");
                false
            }
        }
    }
}

#[async_trait]
impl RoutingEvaluator for YearEvaluator {
    fn name(&self) -> &str {
        "year-router"
    }

    fn description(&self) -> &str {
        "按发行年份路由"
    }

    fn priority(&self) -> i32 {
        60
    }

    fn supported_fields(&self) -> Vec<FieldInfo> {
        vec![FieldInfo::new(
            FIELD,
            "发行年份",
            &["number", "number[]", "range"],
        )]
    }

    fn supported_operators(&self) -> HashMap<String, Vec<OperatorInfo>> {
        HashMap::from([(
            FIELD.to_string(),
            vec![
                OperatorInfo::new(ComparisonOperator::Equals, "年份等于", &["number"]),
                OperatorInfo::new(ComparisonOperator::NotEquals, "年份不等于", &["number"]),
                OperatorInfo::new(ComparisonOperator::GreaterThan, "年份晚于", &["number"]),
                OperatorInfo::new(ComparisonOperator::LessThan, "年份早于", &["number"]),
                OperatorInfo::new(ComparisonOperator::Between, "年份位于区间内（含端点）", &["range"])
                    .with_format("{min, max}，可省略一端"),
                OperatorInfo::new(ComparisonOperator::In, "年份在列表中", &["number[]"]),
                OperatorInfo::new(ComparisonOperator::NotIn, "年份不在列表中", &["number[]"]),
            ],
        )])
    }

    fn can_evaluate(&self, item: &MediaItem, _context: &RoutingContext) -> bool {
        Self::year_of(item).is_some()
    }

    async fn evaluate_routing(
        &self,
        item: &MediaItem,
        context: &RoutingContext,
    ) -> Result<Option<Vec<RoutingDecision>>> {
        let Some(year) = Self::year_of(item) else {
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
            if Self::matches_criteria(value, year) {
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
        let Some(year) = Self::year_of(item) else {
            return false;
        };

        match condition.operator {
            ComparisonOperator::Equals => {
                condition.value.as_f64().map(|n| n == year).unwrap_or(false)
            }
            ComparisonOperator::NotEquals => {
                condition.value.as_f64().map(|n| n != year).unwrap_or(false)
            }
            ComparisonOperator::GreaterThan => {
                condition.value.as_f64().map(|n| year > n).unwrap_or(false)
            }
            ComparisonOperator::LessThan => {
                condition.value.as_f64().map(|n| year < n).unwrap_or(false)
            }
            ComparisonOperator::Between => match condition.value.as_range() {
                Some(range) => {
                    range.min.is_none_or(|min| year >= min)
                        && range.max.is_none_or(|max| year <= max)
                }
                None => {
                    debug!(
                        value_type = condition.value.type_name(),
                        "between 操作符需要区间值"
                    );
                    false
                }
            },
            ComparisonOperator::In => match &condition.value {
                ConditionValue::NumberList(list) => list.contains(&year),
                other => {
                    debug!(value_type = other.type_name(), "in 操作符需要数值数组");
                    false
                }
            },
            ComparisonOperator::NotIn => match &condition.value {
                ConditionValue::NumberList(list) => !list.contains(&year),
                other => {
                    debug!(value_type = other.type_name(), "notIn 操作符需要数值数组");
                    false
                }
            },
            op => {
                debug!(operator = %op, "year 不支持该操作符");
                false
            }
        }
    }
}
