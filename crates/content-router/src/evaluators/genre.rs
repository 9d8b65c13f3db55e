//! 类型评估器
//!
//! 认领 `genre`/`genres` 字段，按内容的类型标签列表路由。
//! 比较统一使用小写。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::evaluator::RoutingEvaluator;
use crate::metadata::{FieldInfo, OperatorInfo};
use crate::models::{
    Condition, ConditionValue, MediaItem, RoutingContext, RoutingDecision,
};
use crate::operators::ComparisonOperator;
use crate::store::RuleStoreAdapter;

const FIELD: &str = "genre";

pub struct GenreEvaluator {
    store: Arc<dyn RuleStoreAdapter>,
}

impl GenreEvaluator {
    pub fn new(store: Arc<dyn RuleStoreAdapter>) -> Self {
        Self { store }
    }

    /// 条目的类型标签，统一小写；缺失或空列表视为无类型信息
    fn genres_of(item: &MediaItem) -> Option<Vec<String>> {
        let genres: Vec<String> = item
            .metadata_field("genres")?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        if genres.is_empty() { None } else { Some(genres) }
    }

    fn matches_criteria(value: &ConditionValue, genres: &[String]) -> bool {
        match value {
            ConditionValue::String(s) => genres.iter().any(|g| g == &s.to_lowercase()),
            ConditionValue::StringList(list) => list
                .iter()
                .any(|s| genres.iter().any(|g| g == &s.to_lowercase())),
            other => {
                debug!(value_type = other.type_name(), "genre criteria 值类型不支持");
                false
            }
        }
    }
}

#[async_trait]
impl RoutingEvaluator for GenreEvaluator {
    fn name(&self) -> &str {
        "genre-router"
    }

    fn description(&self) -> &str {
        "按内容类型标签路由"
    }

    fn priority(&self) -> i32 {
        85
    }

    fn supported_fields(&self) -> Vec<FieldInfo> {
        vec![FieldInfo::new(
            FIELD,
            "内容类型标签（如 action、anime）",
            &["string", "string[]"],
        )]
    }

    fn supported_operators(&self) -> HashMap<String, Vec<OperatorInfo>> {
        HashMap::from([(
            FIELD.to_string(),
            vec![
                OperatorInfo::new(ComparisonOperator::Equals, "包含该类型（精确匹配）", &["string"]),
                OperatorInfo::new(ComparisonOperator::NotEquals, "不包含该类型", &["string"]),
                OperatorInfo::new(ComparisonOperator::Contains, "任一类型含该子串", &["string"]),
                OperatorInfo::new(ComparisonOperator::In, "与列表有交集", &["string[]"]),
                OperatorInfo::new(ComparisonOperator::NotIn, "与列表无交集", &["string[]"]),
                OperatorInfo::new(ComparisonOperator::Regex, "任一类型匹配正则", &["string"])
                    .with_format("正则表达式字符串"),
            ],
        )])
    }

    fn can_evaluate(&self, item: &MediaItem, _context: &RoutingContext) -> bool {
        Self::genres_of(item).is_some()
    }

    async fn evaluate_routing(
        &self,
        item: &MediaItem,
        context: &RoutingContext,
    ) -> Result<Option<Vec<RoutingDecision>>> {
        let Some(genres) = Self::genres_of(item) else {
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
            if Self::matches_criteria(value, &genres) {
                decisions.push(rule.to_decision());
            }
        }

        Ok(Some(decisions))
    }

    fn can_evaluate_condition_field(&self, field: &str) -> bool {
        field == FIELD || field == "genres"
    }

    fn evaluate_condition(
        &self,
        condition: &Condition,
        item: &MediaItem,
        _context: &RoutingContext,
    ) -> bool {
        let Some(genres) = Self::genres_of(item) else {
            return false;
        };

        match condition.operator {
            ComparisonOperator::Equals => condition
                .value
                .as_str()
                .map(|s| genres.iter().any(|g| g == &s.to_lowercase()))
                .unwrap_or(false),
            ComparisonOperator::NotEquals => condition
                .value
                .as_str()
                .map(|s| !genres.iter().any(|g| g == &s.to_lowercase()))
                .unwrap_or(false),
            ComparisonOperator::Contains => condition
                .value
                .as_str()
                .map(|s| {
                    let needle = s.to_lowercase();
                    genres.iter().any(|g| g.contains(&needle))
                })
                .unwrap_or(false),
            ComparisonOperator::In => match &condition.value {
                ConditionValue::StringList(list) => list
                    .iter()
                    .any(|s| genres.iter().any(|g| g == &s.to_lowercase())),
                other => {
                    debug!(value_type = other.type_name(), "in 操作符需要字符串数组");
                    false
                }
            },
            ComparisonOperator::NotIn => match &condition.value {
                ConditionValue::StringList(list) => !list
                    .iter()
                    .any(|s| genres.iter().any(|g| g == &s.to_lowercase())),
                other => {
                    debug!(value_type = other.type_name(), "notIn 操作符需要字符串数组");
                    false
                }
            },
            ComparisonOperator::Regex => {
                let Some(pattern) = condition.value.as_str() else {
                    debug!("regex 操作符需要字符串值");
                    return false;
                };
                match Regex::new(pattern) {
                    Ok(re) => genres.iter().any(|g| re.is_match(g)),
                    Err(e) => {
                        debug!(pattern, error = %e, "正则表达式无效，按不匹配处理");
                        false
                    }
                }
            }
            op => {
                debug!(operator = %op, "genre 不支持该操作符");
                false
            }
        }
    }
}
