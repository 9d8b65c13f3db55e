//! 用户评估器
//!
//! 认领 `user`/`userId`/`userName` 字段，按发起请求的用户路由。
//! 上下文不携带用户信息时整体弃权——片单同步等场景没有请求用户，
//! 此时用户规则不应参与投票。

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

const CRITERIA_KIND: &str = "users";

pub struct UserEvaluator {
    store: Arc<dyn RuleStoreAdapter>,
}

impl UserEvaluator {
    pub fn new(store: Arc<dyn RuleStoreAdapter>) -> Self {
        Self { store }
    }

    fn has_user(context: &RoutingContext) -> bool {
        context.user_id.is_some() || context.user_name.is_some()
    }

    /// 值是否命中当前用户（数值按 id，字符串按用户名）
    fn value_matches_user(value: &ConditionValue, context: &RoutingContext) -> bool {
        match value {
            ConditionValue::Number(id) => context.user_id == Some(*id as i64),
            ConditionValue::String(name) => context.user_name.as_deref() == Some(name.as_str()),
            ConditionValue::NumberList(ids) => ids
                .iter()
                .any(|id| context.user_id == Some(*id as i64)),
            ConditionValue::StringList(names) => names
                .iter()
                .any(|name| context.user_name.as_deref() == Some(name.as_str())),
            other => {
                debug!(value_type = other.type_name(), "users criteria 值类型不支持");
                false
            }
        }
    }
}

#[async_trait]
impl RoutingEvaluator for UserEvaluator {
    fn name(&self) -> &str {
        "user-router"
    }

    fn description(&self) -> &str {
        "按发起请求的用户路由"
    }

    fn priority(&self) -> i32 {
        75
    }

    fn supported_fields(&self) -> Vec<FieldInfo> {
        vec![
            FieldInfo::new("user", "请求用户（id 或用户名）", &["number", "string", "number[]", "string[]"]),
            FieldInfo::new("userId", "请求用户 id", &["number", "number[]"]),
            FieldInfo::new("userName", "请求用户名", &["string", "string[]"]),
        ]
    }

    fn supported_operators(&self) -> HashMap<String, Vec<OperatorInfo>> {
        let id_ops = vec![
            OperatorInfo::new(ComparisonOperator::Equals, "用户 id 等于", &["number"]),
            OperatorInfo::new(ComparisonOperator::NotEquals, "用户 id 不等于", &["number"]),
            OperatorInfo::new(ComparisonOperator::In, "用户 id 在列表中", &["number[]"]),
            OperatorInfo::new(ComparisonOperator::NotIn, "用户 id 不在列表中", &["number[]"]),
        ];
        let name_ops = vec![
            OperatorInfo::new(ComparisonOperator::Equals, "用户名等于", &["string"]),
            OperatorInfo::new(ComparisonOperator::NotEquals, "用户名不等于", &["string"]),
            OperatorInfo::new(ComparisonOperator::In, "用户名在列表中", &["string[]"]),
            OperatorInfo::new(ComparisonOperator::NotIn, "用户名不在列表中", &["string[]"]),
        ];
        let mixed_ops = vec![
            OperatorInfo::new(ComparisonOperator::Equals, "命中当前用户", &["number", "string"]),
            OperatorInfo::new(ComparisonOperator::NotEquals, "未命中当前用户", &["number", "string"]),
            OperatorInfo::new(ComparisonOperator::In, "当前用户在列表中", &["number[]", "string[]"]),
            OperatorInfo::new(ComparisonOperator::NotIn, "当前用户不在列表中", &["number[]", "string[]"]),
        ];

        HashMap::from([
            ("user".to_string(), mixed_ops),
            ("userId".to_string(), id_ops),
            ("userName".to_string(), name_ops),
        ])
    }

    fn can_evaluate(&self, _item: &MediaItem, context: &RoutingContext) -> bool {
        Self::has_user(context)
    }

    async fn evaluate_routing(
        &self,
        _item: &MediaItem,
        context: &RoutingContext,
    ) -> Result<Option<Vec<RoutingDecision>>> {
        // 无请求用户时弃权，而不是"评估过但没匹配"
        if !Self::has_user(context) {
            return Ok(None);
        }

        let target = context.content_type.target_type();
        let rules = self.store.get_rules_by_type(CRITERIA_KIND).await?;

        let mut decisions = Vec::new();
        for rule in rules {
            if rule.target_type != target {
                continue;
            }
            if rule.condition.is_some() {
                debug!(rule_id = rule.id, "旧式规则同时携带条件树，交由通用路径处理");
                continue;
            }
            let Some(value) = rule.criteria.as_ref().and_then(|c| c.get(CRITERIA_KIND)) else {
                continue;
            };
            if Self::value_matches_user(value, context) {
                decisions.push(rule.to_decision());
            }
        }

        Ok(Some(decisions))
    }

    fn can_evaluate_condition_field(&self, field: &str) -> bool {
        matches!(field, "user" | "userId" | "userName")
    }

    fn evaluate_condition(
        &self,
        condition: &Condition,
        _item: &MediaItem,
        context: &RoutingContext,
    ) -> bool {
        if !Self::has_user(context) {
            return false;
        }

        // 先按字段核对值形状：None 表示形状不匹配，取反操作符也按不匹配处理
        let hit = match condition.field.as_str() {
            "userId" => match &condition.value {
                ConditionValue::Number(id) => Some(context.user_id == Some(*id as i64)),
                ConditionValue::NumberList(ids) => {
                    Some(ids.iter().any(|id| context.user_id == Some(*id as i64)))
                }
                _ => None,
            },
            "userName" => match &condition.value {
                ConditionValue::String(name) => {
                    Some(context.user_name.as_deref() == Some(name.as_str()))
                }
                ConditionValue::StringList(names) => Some(
                    names
                        .iter()
                        .any(|name| context.user_name.as_deref() == Some(name.as_str())),
                ),
                _ => None,
            },
            _ => match &condition.value {
                ConditionValue::Number(_)
                | ConditionValue::String(_)
                | ConditionValue::NumberList(_)
                | ConditionValue::StringList(_) => {
                    Some(Self::value_matches_user(&condition.value, context))
                }
                _ => None,
            },
        };

        let Some(hit) = hit else {
            debug!(
                field = %condition.field,
                value_type = condition.value.type_name(),
                "user 条件值类型不支持"
            );
            return false;
        };

        match condition.operator {
            ComparisonOperator::Equals | ComparisonOperator::In => hit,
            ComparisonOperator::NotEquals | ComparisonOperator::NotIn => !hit,
            op => {
                debug!(operator = %op, "user 不支持该操作符");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use crate::store::InMemoryRuleStore;
    use serde_json::json;

    fn evaluator() -> UserEvaluator {
        UserEvaluator::new(Arc::new(InMemoryRuleStore::new()))
    }

    fn item() -> MediaItem {
        MediaItem::new("Test", ContentType::Movie, json!({}))
    }

    fn ctx_with_user() -> RoutingContext {
        RoutingContext::new(ContentType::Movie).with_user(Some(42), Some("alice"))
    }

    #[test]
    fn test_user_id_equals() {
        let e = evaluator();
        let condition = Condition::new("userId", ComparisonOperator::Equals, 42);
        assert!(e.evaluate_condition(&condition, &item(), &ctx_with_user()));

        let condition = Condition::new("userId", ComparisonOperator::Equals, 7);
        assert!(!e.evaluate_condition(&condition, &item(), &ctx_with_user()));
    }

    #[test]
    fn test_user_name_in_list() {
        let e = evaluator();
        let condition = Condition::new("userName", ComparisonOperator::In, vec!["alice", "bob"]);
        assert!(e.evaluate_condition(&condition, &item(), &ctx_with_user()));

        let condition = Condition::new("userName", ComparisonOperator::NotIn, vec!["bob"]);
        assert!(e.evaluate_condition(&condition, &item(), &ctx_with_user()));
    }

    #[test]
    fn test_mixed_user_field() {
        let e = evaluator();
        // user 字段同时接受 id 与用户名
        let by_id = Condition::new("user", ComparisonOperator::Equals, 42);
        let by_name = Condition::new("user", ComparisonOperator::Equals, "alice");
        assert!(e.evaluate_condition(&by_id, &item(), &ctx_with_user()));
        assert!(e.evaluate_condition(&by_name, &item(), &ctx_with_user()));
    }

    #[test]
    fn test_no_user_in_context_is_false() {
        let e = evaluator();
        let ctx = RoutingContext::new(ContentType::Movie);
        let condition = Condition::new("userId", ComparisonOperator::Equals, 42);
        assert!(!e.evaluate_condition(&condition, &item(), &ctx));
        assert!(!e.can_evaluate(&item(), &ctx));
    }

    #[test]
    fn test_not_equals_fails_closed_on_malformed_value() {
        let e = evaluator();
        let condition = Condition::new("userId", ComparisonOperator::NotEquals, true);
        assert!(!e.evaluate_condition(&condition, &item(), &ctx_with_user()));
    }

    #[tokio::test]
    async fn test_evaluate_routing_abstains_without_user() {
        let e = evaluator();
        let ctx = RoutingContext::new(ContentType::Movie);
        let result = e.evaluate_routing(&item(), &ctx).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_evaluate_routing_matches_user_rule() {
        use crate::models::{RouterRule, TargetType};
        use chrono::Utc;
        use std::collections::HashMap as Map;

        let store = Arc::new(InMemoryRuleStore::new());
        let mut criteria = Map::new();
        criteria.insert(
            CRITERIA_KIND.to_string(),
            ConditionValue::from(vec!["alice"]),
        );
        store
            .insert(RouterRule {
                id: 8,
                name: "alice requests to main".to_string(),
                target_type: TargetType::Radarr,
                target_instance_id: 1,
                condition: None,
                criteria: Some(criteria),
                root_folder: None,
                quality_profile: Some("Ultra-HD".to_string()),
                order: 40,
                enabled: true,
                search_on_add: None,
                season_monitoring: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();

        let e = UserEvaluator::new(store);
        let decisions = e
            .evaluate_routing(&item(), &ctx_with_user())
            .await
            .unwrap()
            .expect("有请求用户，不应弃权");

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].quality_profile.as_deref(), Some("Ultra-HD"));
    }
}
