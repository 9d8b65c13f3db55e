//! 内容路由引擎
//!
//! 片单自动化工具的核心决策组件：当一条内容需要被获取时，
//! 对照用户编写的路由规则，决定应使用哪个下游实例、哪个质量档案、
//! 哪个存储目录。支持：
//! - 递归布尔条件树（Condition / ConditionGroup）建模与防御性校验
//! - 可插拔的字段评估器与按优先级排序的注册表
//! - 旧式扁平 criteria 规则与通用条件树规则的统一解析
//! - 多规则匹配的按权重排序输出，最终裁决留给调用方

pub mod error;
pub mod evaluator;
pub mod evaluators;
pub mod metadata;
pub mod models;
pub mod operators;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod tree;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Result, RouterError};
pub use evaluator::RoutingEvaluator;
pub use metadata::{EvaluatorMetadata, FieldInfo, OperatorInfo};
pub use models::{
    Condition, ConditionGroup, ConditionNode, ConditionValue, ContentType, CriteriaValue,
    MediaItem, RangeValue, RouterRule, RoutingContext, RoutingDecision, TargetType,
};
pub use operators::{ComparisonOperator, LogicalOperator};
pub use registry::EvaluatorRegistry;
pub use resolver::RoutingResolver;
pub use store::{InMemoryRuleStore, RuleStoreAdapter};
pub use tree::TreeEvaluator;
pub use validation::{
    MAX_CONDITION_DEPTH, validate_for_authoring, validate_tree, validate_tree_with_depth,
};
