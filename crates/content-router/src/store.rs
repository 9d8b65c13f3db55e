//! 规则存储适配
//!
//! 引擎把规则持久化视为外部只读依赖，这里定义适配接口；
//! 同时提供 DashMap 实现的线程安全内存存储，供测试和单机部署使用。
//! 条件树的结构校验在写入时执行一次，评估路径假定树已校验。

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{info, instrument, warn};

use crate::error::{Result, RouterError};
use crate::models::{RouterRule, TargetType};
use crate::validation::validate_tree;

/// 规则存储适配接口
///
/// 引擎只读，不写回。实现者负责保证返回的规则是时点快照。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleStoreAdapter: Send + Sync {
    /// 按 criteria 类别拉取启用的旧式规则（如 "genre"、"users"）
    async fn get_rules_by_type(&self, kind: &str) -> Result<Vec<RouterRule>>;

    /// 拉取指定目标类型的全部启用规则，按存储顺序返回
    async fn get_all_enabled_rules(&self, target: TargetType) -> Result<Vec<RouterRule>>;
}

/// 内存规则存储
#[derive(Clone)]
pub struct InMemoryRuleStore {
    rules: Arc<DashMap<i64, RouterRule>>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 写入规则
    ///
    /// 条件树在此做一次结构校验（深度 + 引用循环），坏树不入库。
    #[instrument(skip(self, rule), fields(rule_id = rule.id, rule_name = %rule.name))]
    pub fn insert(&self, rule: RouterRule) -> Result<()> {
        if let Some(condition) = &rule.condition {
            validate_tree(condition)?;
        }

        let rule_id = rule.id;
        self.rules.insert(rule_id, rule);

        info!("规则已写入: {}", rule_id);
        Ok(())
    }

    /// 从 JSON 文档写入规则
    #[instrument(skip(self, json))]
    pub fn insert_from_json(&self, json: &str) -> Result<i64> {
        let rule: RouterRule = serde_json::from_str(json)?;
        let rule_id = rule.id;
        self.insert(rule)?;
        Ok(rule_id)
    }

    /// 删除规则
    #[instrument(skip(self))]
    pub fn delete(&self, rule_id: i64) -> Result<()> {
        if self.rules.remove(&rule_id).is_some() {
            info!("规则已删除: {}", rule_id);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", rule_id);
            Err(RouterError::RuleNotFound(rule_id))
        }
    }

    pub fn get(&self, rule_id: i64) -> Option<RouterRule> {
        self.rules.get(&rule_id).map(|r| r.clone())
    }

    /// 按 id 顺序返回全部规则
    pub fn list_all(&self) -> Vec<RouterRule> {
        let mut rules: Vec<_> = self.rules.iter().map(|r| r.value().clone()).collect();
        rules.sort_by_key(|r| r.id);
        rules
    }

    /// 清空所有规则
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.rules.len();
        self.rules.clear();
        info!("已清空 {} 条规则", count);
    }
}

impl Default for InMemoryRuleStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuleStoreAdapter for InMemoryRuleStore {
    async fn get_rules_by_type(&self, kind: &str) -> Result<Vec<RouterRule>> {
        let mut rules: Vec<_> = self
            .rules
            .iter()
            .filter(|r| r.enabled && r.criteria_kind() == Some(kind))
            .map(|r| r.value().clone())
            .collect();
        rules.sort_by_key(|r| r.id);
        Ok(rules)
    }

    async fn get_all_enabled_rules(&self, target: TargetType) -> Result<Vec<RouterRule>> {
        let mut rules: Vec<_> = self
            .rules
            .iter()
            .filter(|r| r.enabled && r.target_type == target)
            .map(|r| r.value().clone())
            .collect();
        rules.sort_by_key(|r| r.id);
        Ok(rules)
    }
}
