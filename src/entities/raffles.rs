use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 抽奖活动实体 (本服务只读)
/// 概念说明:
/// - code: 对外展示的活动编号, 全局唯一, 实时房间以它命名
/// - status: 生命周期状态文本 (pending/active/closed), 枚举取值由平台主服务维护,
///   网关只透传, 不解释
/// - pot_fires / pot_coins: 双币种奖池累计 (虚拟币整数)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "raffles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// 活动编号 (唯一)
    pub code: String,
    pub name: String,
    /// 平台侧维护的状态文本
    pub status: String,
    pub pot_fires: i64,
    pub pot_coins: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
