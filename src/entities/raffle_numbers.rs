use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 号码实体 (本服务只读)
/// - idx: 活动内编号 (raffle_id, idx) 唯一, 非全局唯一
/// - status: available / reserved / sold, 写路径在平台主服务,
///   预定原子性与过期回收不在网关职责内
/// - user_id: 当前持有人, 未售出时为 NULL
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "raffle_numbers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub raffle_id: i64,
    pub idx: i32,
    pub status: String,
    pub user_id: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
