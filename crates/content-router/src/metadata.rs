//! 评估器元数据
//!
//! 只读描述信息，供规则编辑界面约束用户可选的字段与操作符。
//! 引擎评估时不使用这些声明；声明与实际实现不一致属于潜在缺陷，
//! 不是运行时错误。

use std::collections::HashMap;

use serde::Serialize;

use crate::operators::ComparisonOperator;
use crate::registry::EvaluatorRegistry;

/// 字段描述
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    pub description: String,
    /// 该字段可接受的值类型（如 "string"、"string[]"、"range"）
    pub value_types: Vec<String>,
}

impl FieldInfo {
    pub fn new(name: &str, description: &str, value_types: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            value_types: value_types.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// 操作符描述
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorInfo {
    pub operator: ComparisonOperator,
    pub description: String,
    pub value_types: Vec<String>,
    /// 值的附加格式说明（如区间对象的形状），无则省略
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_format: Option<String>,
}

impl OperatorInfo {
    pub fn new(operator: ComparisonOperator, description: &str, value_types: &[&str]) -> Self {
        Self {
            operator,
            description: description.to_string(),
            value_types: value_types.iter().map(|s| s.to_string()).collect(),
            value_format: None,
        }
    }

    pub fn with_format(mut self, value_format: &str) -> Self {
        self.value_format = Some(value_format.to_string());
        self
    }
}

/// 单个评估器的完整元数据
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatorMetadata {
    pub name: String,
    pub description: String,
    pub supported_fields: Vec<FieldInfo>,
    pub supported_operators: HashMap<String, Vec<OperatorInfo>>,
}

impl EvaluatorMetadata {
    /// 汇总注册表中所有启用评估器的元数据，按优先级降序
    pub fn collect(registry: &EvaluatorRegistry) -> Vec<EvaluatorMetadata> {
        registry
            .evaluators()
            .iter()
            .filter(|e| e.enabled())
            .map(|e| EvaluatorMetadata {
                name: e.name().to_string(),
                description: e.description().to_string(),
                supported_fields: e.supported_fields(),
                supported_operators: e.supported_operators(),
            })
            .collect()
    }
}
