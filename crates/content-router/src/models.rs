//! 路由引擎领域模型

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operators::{ComparisonOperator, LogicalOperator};

/// 内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Show,
}

impl ContentType {
    /// 内容类型对应的下游目标类型
    pub fn target_type(self) -> TargetType {
        match self {
            Self::Movie => TargetType::Radarr,
            Self::Show => TargetType::Sonarr,
        }
    }
}

/// 下游目标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Radarr,
    Sonarr,
}

/// 条件值（多态）
///
/// 反序列化按变体声明顺序尝试，数组先按数值数组解析再按字符串数组解析，
/// 对象形态的 Range 和 Criteria 通过 `deny_unknown_fields` 区分。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Bool(bool),
    Number(f64),
    String(String),
    NumberList(Vec<f64>),
    StringList(Vec<String>),
    Range(RangeValue),
    Criteria(CriteriaValue),
}

/// 数值区间，min/max 均可省略，但编辑校验要求至少设置一端
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// 结构化引用值（如质量档案、标签等带 id 的实体）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CriteriaValue {
    pub id: i64,
    pub name: String,
}

impl ConditionValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_string_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_number_list(&self) -> Option<&[f64]> {
        match self {
            Self::NumberList(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<&RangeValue> {
        match self {
            Self::Range(range) => Some(range),
            _ => None,
        }
    }

    /// 判断值是否为空（编辑校验用）
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(s) => s.trim().is_empty(),
            Self::StringList(list) => list.is_empty(),
            Self::NumberList(list) => list.is_empty(),
            Self::Range(range) => range.min.is_none() && range.max.is_none(),
            Self::Bool(_) | Self::Number(_) | Self::Criteria(_) => false,
        }
    }

    /// 获取值的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::NumberList(_) => "number[]",
            Self::StringList(_) => "string[]",
            Self::Range(_) => "range",
            Self::Criteria(_) => "criteria",
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for ConditionValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for ConditionValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for ConditionValue {
    fn from(n: i32) -> Self {
        Self::Number(n as f64)
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

impl From<Vec<&str>> for ConditionValue {
    fn from(list: Vec<&str>) -> Self {
        Self::StringList(list.into_iter().map(String::from).collect())
    }
}

impl From<Vec<f64>> for ConditionValue {
    fn from(list: Vec<f64>) -> Self {
        Self::NumberList(list)
    }
}

impl From<RangeValue> for ConditionValue {
    fn from(range: RangeValue) -> Self {
        Self::Range(range)
    }
}

/// 条件节点（叶子或逻辑组）
///
/// 组节点以 `Arc` 持有，程序化构造时允许共享节点——
/// 这正是结构校验要按引用身份拒绝的非树形态。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionNode {
    Condition(Condition),
    Group(Arc<ConditionGroup>),
}

impl ConditionNode {
    pub fn condition(condition: Condition) -> Self {
        Self::Condition(condition)
    }

    pub fn group(group: ConditionGroup) -> Self {
        Self::Group(Arc::new(group))
    }
}

/// 叶子条件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: ConditionValue,
    #[serde(default)]
    pub negate: bool,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
            negate: false,
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }
}

/// 逻辑组节点
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub operator: LogicalOperator,
    pub conditions: Vec<ConditionNode>,
    #[serde(default)]
    pub negate: bool,
}

impl ConditionGroup {
    pub fn new(operator: LogicalOperator, conditions: Vec<ConditionNode>) -> Self {
        Self {
            operator,
            conditions,
            negate: false,
        }
    }

    pub fn and(conditions: Vec<ConditionNode>) -> Self {
        Self::new(LogicalOperator::And, conditions)
    }

    pub fn or(conditions: Vec<ConditionNode>) -> Self {
        Self::new(LogicalOperator::Or, conditions)
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }
}

/// 路由规则（持久化实体，引擎侧只读）
///
/// `condition` 与 `criteria` 在规则层面互斥：前者是通用条件树，
/// 后者是按评估器类别划分的旧式扁平条件。存量数据可能两者都带，
/// 此时以条件树为准。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterRule {
    pub id: i64,
    pub name: String,
    pub target_type: TargetType,
    pub target_instance_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<HashMap<String, ConditionValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_profile: Option<String>,
    /// 权重，数值越大越优先
    pub order: i32,
    pub enabled: bool,
    /// 添加后立即搜索（透传给下游，引擎不解释）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_on_add: Option<bool>,
    /// 季监控策略（透传给下游，引擎不解释）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_monitoring: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl RouterRule {
    /// 由本规则生成一条路由决策
    pub fn to_decision(&self) -> RoutingDecision {
        RoutingDecision {
            instance_id: self.target_instance_id,
            quality_profile: self.quality_profile.clone(),
            root_folder: self.root_folder.clone(),
            weight: self.order,
            search_on_add: self.search_on_add,
            season_monitoring: self.season_monitoring.clone(),
        }
    }

    /// 旧式规则的条件类别（criteria 映射的首个键）
    pub fn criteria_kind(&self) -> Option<&str> {
        self.criteria
            .as_ref()
            .and_then(|c| c.keys().next())
            .map(String::as_str)
    }
}

/// 待路由的内容条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub title: String,
    pub content_type: ContentType,
    /// 上游元数据查询填充的字段包，结构由各评估器自行解释
    #[serde(default)]
    pub metadata: Value,
}

impl MediaItem {
    pub fn new(title: impl Into<String>, content_type: ContentType, metadata: Value) -> Self {
        Self {
            title: title.into(),
            content_type,
            metadata,
        }
    }

    /// 获取元数据字段值（支持点号分隔的路径，如 "ratings.imdb" 或 "genres.0"）
    pub fn metadata_field(&self, path: &str) -> Option<&Value> {
        let mut current = &self.metadata;

        for part in path.split('.') {
            match current {
                Value::Object(map) => {
                    current = map.get(part)?;
                }
                Value::Array(arr) => {
                    let index: usize = part.parse().ok()?;
                    current = arr.get(index)?;
                }
                _ => return None,
            }
        }

        Some(current)
    }
}

/// 路由请求上下文
///
/// 每次解析请求创建一个，从不持久化。
#[derive(Debug, Clone)]
pub struct RoutingContext {
    pub content_type: ContentType,
    /// 发起请求的用户（片单同步场景下可能缺失）
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    /// 其他请求范围属性
    pub attributes: Value,
}

impl RoutingContext {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            user_id: None,
            user_name: None,
            attributes: Value::Null,
        }
    }

    pub fn with_user(mut self, user_id: Option<i64>, user_name: Option<&str>) -> Self {
        self.user_id = user_id;
        self.user_name = user_name.map(String::from);
        self
    }
}

/// 路由决策（引擎输出）
///
/// 除元组值本身外没有身份；多条规则各自产生独立的决策，引擎不做合并。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    pub instance_id: i64,
    pub quality_profile: Option<String>,
    pub root_folder: Option<String>,
    /// 取自规则的 order
    pub weight: i32,
    pub search_on_add: Option<bool>,
    pub season_monitoring: Option<String>,
}
