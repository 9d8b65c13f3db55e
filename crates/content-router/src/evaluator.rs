//! 评估器插件契约
//!
//! 每个评估器是一个自包含单元：声明自己认领的字段与操作符，
//! 实现这些字段的比较语义，并保留对旧式扁平 criteria 规则的
//! 独立路由能力。评估器之间不做中心化协调，字段归属由注册表
//! 按优先级解析。

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::metadata::{FieldInfo, OperatorInfo};
use crate::models::{Condition, MediaItem, RoutingContext, RoutingDecision};

/// 路由评估器插件
///
/// 实现者按自己认领的字段实现契约的相应子集即可；
/// 所有评估方法都应是只读的，同一次解析内可被并发调用。
#[async_trait]
pub trait RoutingEvaluator: Send + Sync {
    /// 评估器名称（唯一）
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 优先级，数值越大越先参与字段归属判定
    fn priority(&self) -> i32;

    /// 禁用的评估器不参与任何评估
    fn enabled(&self) -> bool {
        true
    }

    /// 声明支持的字段，仅供编辑界面消费
    fn supported_fields(&self) -> Vec<FieldInfo>;

    /// 声明各字段支持的操作符，仅供编辑界面消费
    fn supported_operators(&self) -> HashMap<String, Vec<OperatorInfo>>;

    /// 快速前置判断：内容条目是否携带本评估器所需的数据
    ///
    /// 返回 false 时旧式路径会整体跳过该评估器。
    fn can_evaluate(&self, item: &MediaItem, context: &RoutingContext) -> bool;

    /// 旧式路径：独立拉取本类别的 criteria 规则并完成匹配
    ///
    /// 返回 `None` 表示无可评估内容（弃权，如上下文缺少请求用户），
    /// `Some(vec![])` 表示评估执行过但没有匹配——两者对调用方含义不同，
    /// 不能混用空集合表达弃权。
    async fn evaluate_routing(
        &self,
        item: &MediaItem,
        context: &RoutingContext,
    ) -> Result<Option<Vec<RoutingDecision>>>;

    /// 字段归属查询：本评估器是否认领该条件字段
    fn can_evaluate_condition_field(&self, field: &str) -> bool;

    /// 评估自己认领字段上的单个叶子条件
    ///
    /// 必须是全函数：不支持的操作符或形状不匹配的值返回 false，
    /// 不抛错。叶子的 negate 由条件树评估器在外层统一取反，
    /// 实现者不处理。
    fn evaluate_condition(
        &self,
        condition: &Condition,
        item: &MediaItem,
        context: &RoutingContext,
    ) -> bool;
}
