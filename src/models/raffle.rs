use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 活动头部字段 (快照携带)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RaffleSummary {
    pub id: i64,
    pub code: String,
    pub name: String,
    /// 平台侧维护的状态文本, 网关只透传
    pub status: String,
    pub pot_fires: i64,
    pub pot_coins: i64,
}

/// 单个号码视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RaffleNumberView {
    pub idx: i32,
    pub status: String,
    pub user_id: Option<i64>,
    /// 持有人展示名 (左连接 users, 未售出为 NULL)
    pub username: Option<String>,
}

/// 售卖统计, number_reserved / number_purchased / number_released 广播携带。
/// 活动查不到时各字段置 0 而不是拦截广播 (见 DESIGN.md 决策 2)。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleStats {
    /// 已购号码的去重持有人数量
    pub participants: i64,
    pub pot_fires: i64,
    pub pot_coins: i64,
    pub sold_numbers: i64,
}

/// 活动快照: 头部 + 聚合计数 + 全量号码列表 + 房间在线人数。
/// 两次读组装, 不保证事务一致 (与写路径最终一致)。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RaffleSnapshot {
    pub raffle: RaffleSummary,
    pub participants: i64,
    pub sold_numbers: i64,
    pub reserved_numbers: i64,
    /// 当前房间人数 (按用户去重, 房间未被跟踪时为 0)
    pub viewer_count: u64,
    pub numbers: Vec<RaffleNumberView>,
}

impl RaffleSnapshot {
    /// 组装快照。号码列表按 idx 升序排序, 不信任驱动的返回顺序。
    pub fn from_parts(
        raffle: RaffleSummary,
        participants: i64,
        sold_numbers: i64,
        reserved_numbers: i64,
        mut numbers: Vec<RaffleNumberView>,
        viewer_count: u64,
    ) -> Self {
        numbers.sort_unstable_by_key(|n| n.idx);
        Self {
            raffle,
            participants,
            sold_numbers,
            reserved_numbers,
            viewer_count,
            numbers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RaffleSummary {
        RaffleSummary {
            id: 7,
            code: "RIFA-001".to_string(),
            name: "Rifa de prueba".to_string(),
            status: "active".to_string(),
            pot_fires: 500,
            pot_coins: 120,
        }
    }

    fn number(idx: i32, status: &str, user_id: Option<i64>) -> RaffleNumberView {
        RaffleNumberView {
            idx,
            status: status.to_string(),
            user_id,
            username: user_id.map(|id| format!("user{id}")),
        }
    }

    #[test]
    fn test_from_parts_sorts_numbers_by_idx() {
        let numbers = vec![
            number(9, "available", None),
            number(0, "sold", Some(1)),
            number(4, "reserved", Some(2)),
            number(1, "sold", Some(1)),
            number(7, "available", None),
            number(2, "sold", Some(3)),
            number(5, "reserved", Some(2)),
            number(3, "available", None),
            number(8, "available", None),
            number(6, "available", None),
        ];

        let snapshot = RaffleSnapshot::from_parts(summary(), 3, 3, 2, numbers, 4);

        assert_eq!(snapshot.sold_numbers, 3);
        assert_eq!(snapshot.reserved_numbers, 2);
        assert_eq!(snapshot.viewer_count, 4);
        assert_eq!(snapshot.numbers.len(), 10);
        let idxs: Vec<i32> = snapshot.numbers.iter().map(|n| n.idx).collect();
        assert_eq!(idxs, (0..10).collect::<Vec<i32>>());
    }

    #[test]
    fn test_snapshot_wire_field_names() {
        let snapshot =
            RaffleSnapshot::from_parts(summary(), 0, 0, 0, vec![number(0, "available", None)], 1);
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(value["raffle"]["potFires"], 500);
        assert_eq!(value["raffle"]["potCoins"], 120);
        assert_eq!(value["soldNumbers"], 0);
        assert_eq!(value["reservedNumbers"], 0);
        assert_eq!(value["viewerCount"], 1);
        assert!(value["numbers"][0]["userId"].is_null());
    }

    #[test]
    fn test_sale_stats_default_is_zero_filled() {
        let stats = SaleStats::default();
        assert_eq!(stats.participants, 0);
        assert_eq!(stats.pot_fires, 0);
        assert_eq!(stats.pot_coins, 0);
        assert_eq!(stats.sold_numbers, 0);
    }
}
