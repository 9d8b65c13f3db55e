//! 单元测试用的桩评估器与测试数据构造

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;

use crate::error::{Result, RouterError};
use crate::evaluator::RoutingEvaluator;
use crate::metadata::{FieldInfo, OperatorInfo};
use crate::models::{
    Condition, ContentType, MediaItem, RoutingContext, RoutingDecision,
};

/// 桩路由结果
pub(crate) enum StubRoutingOutcome {
    Abstain,
    Decisions(Vec<RoutingDecision>),
    Fail,
}

/// 可配置的桩评估器
pub(crate) struct StubEvaluator {
    pub name: String,
    pub priority: i32,
    pub enabled: bool,
    pub fields: Vec<String>,
    pub condition_result: bool,
    pub condition_calls: Arc<AtomicUsize>,
    pub routing_outcome: StubRoutingOutcome,
}

impl StubEvaluator {
    pub fn new(name: &str, priority: i32, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            priority,
            enabled: true,
            fields: fields.iter().map(|s| s.to_string()).collect(),
            condition_result: true,
            condition_calls: Arc::new(AtomicUsize::new(0)),
            routing_outcome: StubRoutingOutcome::Abstain,
        }
    }

    pub fn returning(mut self, result: bool) -> Self {
        self.condition_result = result;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_routing(mut self, decisions: Vec<RoutingDecision>) -> Self {
        self.routing_outcome = StubRoutingOutcome::Decisions(decisions);
        self
    }

    pub fn failing_routing(mut self) -> Self {
        self.routing_outcome = StubRoutingOutcome::Fail;
        self
    }

    pub fn call_count(&self) -> usize {
        self.condition_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingEvaluator for StubEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "测试桩"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn supported_fields(&self) -> Vec<FieldInfo> {
        self.fields
            .iter()
            .map(|f| FieldInfo::new(f, "测试字段", &["string"]))
            .collect()
    }

    fn supported_operators(&self) -> HashMap<String, Vec<OperatorInfo>> {
        HashMap::new()
    }

    fn can_evaluate(&self, _item: &MediaItem, _context: &RoutingContext) -> bool {
        true
    }

    async fn evaluate_routing(
        &self,
        _item: &MediaItem,
        _context: &RoutingContext,
    ) -> Result<Option<Vec<RoutingDecision>>> {
        match &self.routing_outcome {
            StubRoutingOutcome::Abstain => Ok(None),
            StubRoutingOutcome::Decisions(decisions) => Ok(Some(decisions.clone())),
            StubRoutingOutcome::Fail => Err(RouterError::StoreError("桩故障".to_string())),
        }
    }

    fn can_evaluate_condition_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn evaluate_condition(
        &self,
        _condition: &Condition,
        _item: &MediaItem,
        _context: &RoutingContext,
    ) -> bool {
        self.condition_calls.fetch_add(1, Ordering::SeqCst);
        self.condition_result
    }
}

/// 测试用电影条目
pub(crate) fn movie_item() -> MediaItem {
    MediaItem::new(
        "Test Movie",
        ContentType::Movie,
        json!({
            "certification": "PG-13",
            "genres": ["action", "sci-fi"],
            "originalLanguage": "en",
            "year": 2014
        }),
    )
}

/// 测试用电影上下文
pub(crate) fn movie_context() -> RoutingContext {
    RoutingContext::new(ContentType::Movie)
}

/// 构造一条最小决策
pub(crate) fn decision(instance_id: i64, weight: i32) -> RoutingDecision {
    RoutingDecision {
        instance_id,
        quality_profile: None,
        root_folder: None,
        weight,
        search_on_add: None,
        season_monitoring: None,
    }
}
