//! 语言评估器
//!
//! 认领 `language`/`originalLanguage` 字段，按内容的原始语言路由。
//! 语言代码比较忽略大小写。

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

const FIELD: &str = "language";

pub struct LanguageEvaluator {
    store: Arc<dyn RuleStoreAdapter>,
}

impl LanguageEvaluator {
    pub fn new(store: Arc<dyn RuleStoreAdapter>) -> Self {
        Self { store }
    }

    /// 条目的原始语言，优先取 originalLanguage，回退到 language
    fn language_of(item: &MediaItem) -> Option<String> {
        item.metadata_field("originalLanguage")
            .or_else(|| item.metadata_field(FIELD))
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }

    fn matches_criteria(value: &ConditionValue, language: &str) -> bool {
        match value {
            ConditionValue::String(s) => s.eq_ignore_ascii_case(language),
            ConditionValue::StringList(list) => {
                list.iter().any(|s| s.eq_ignore_ascii_case(language))
            }
            other => {
                debug!(value_type = other.type_name(), "language criteria 值类型不支持");
                false
            }
        }
    }
}

#[async_trait]
impl RoutingEvaluator for LanguageEvaluator {
    fn name(&self) -> &str {
        "language-router"
    }

    fn description(&self) -> &str {
        "按内容原始语言路由"
    }

    fn priority(&self) -> i32 {
        65
    }

    fn supported_fields(&self) -> Vec<FieldInfo> {
        vec![FieldInfo::new(
            FIELD,
            "原始语言代码（如 en、ja）",
            &["string", "string[]"],
        )]
    }

    fn supported_operators(&self) -> HashMap<String, Vec<OperatorInfo>> {
        let ops = vec![
            OperatorInfo::new(ComparisonOperator::Equals, "语言等于（忽略大小写）", &["string"]),
            OperatorInfo::new(ComparisonOperator::NotEquals, "语言不等于", &["string"]),
            OperatorInfo::new(ComparisonOperator::Contains, "语言代码含子串", &["string"]),
            OperatorInfo::new(ComparisonOperator::In, "语言在列表中", &["string[]"]),
            OperatorInfo::new(ComparisonOperator::NotIn, "语言不在列表中", &["string[]"]),
        ];
        HashMap::from([
            (FIELD.to_string(), ops.clone()),
            ("originalLanguage".to_string(), ops),
        ])
    }

    fn can_evaluate(&self, item: &MediaItem, _context: &RoutingContext) -> bool {
        Self::language_of(item).is_some()
    }

    async fn evaluate_routing(
        &self,
        item: &MediaItem,
        context: &RoutingContext,
    ) -> Result<Option<Vec<RoutingDecision>>> {
        let Some(language) = Self::language_of(item) else {
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
            if Self::matches_criteria(value, &language) {
                decisions.push(rule.to_decision());
            }
        }

        Ok(Some(decisions))
    }

    fn can_evaluate_condition_field(&self, field: &str) -> bool {
        field == FIELD || field == "originalLanguage"
    }

    fn evaluate_condition(
        &self,
        condition: &Condition,
        item: &MediaItem,
        _context: &RoutingContext,
    ) -> bool {
        let Some(language) = Self::language_of(item) else {
            return false;
        };

        match condition.operator {
            ComparisonOperator::Equals => condition
                .value
                .as_str()
                .map(|s| s.eq_ignore_ascii_case(&language))
                .unwrap_or(false),
            ComparisonOperator::NotEquals => condition
                .value
                .as_str()
                .map(|s| !s.eq_ignore_ascii_case(&language))
                .unwrap_or(false),
            ComparisonOperator::Contains => condition
                .value
                .as_str()
                .map(|s| language.contains(&s.to_lowercase()))
                .unwrap_or(false),
            ComparisonOperator::In => match &condition.value {
                ConditionValue::StringList(list) => {
                    list.iter().any(|s| s.eq_ignore_ascii_case(&language))
                }
                other => {
                    debug!(value_type = other.type_name(), "in 操作符需要字符串数组");
                    false
                }
            },
            ComparisonOperator::NotIn => match &condition.value {
                ConditionValue::StringList(list) => {
                    !list.iter().any(|s| s.eq_ignore_ascii_case(&language))
                }
                other => {
                    debug!(value_type = other.type_name(), "notIn 操作符需要字符串数组");
                    false
                }
            },
            op => {
                debug!(operator = %op, "language 不支持该操作符");
                false
            }
        }
    }
}
