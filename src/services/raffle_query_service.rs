use crate::entities::raffle_entity;
use crate::error::AppResult;
use crate::models::{RaffleNumberView, RaffleSnapshot, RaffleSummary, SaleStats};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbBackend, EntityTrait, FromQueryResult, QueryFilter,
    Statement,
};

/// 持久化协作方的读契约。路由层只通过这个 trait 访问数据库,
/// 测试用桩实现替换。所有写语句都在平台主服务, 这里没有任何写路径。
#[allow(async_fn_in_trait)]
pub trait RaffleStore: Clone + Send + Sync + 'static {
    /// 按活动编号查活动 (join 的存在性检查)
    async fn find_by_code(&self, code: &str) -> AppResult<Option<raffle_entity::Model>>;

    /// 快照构建: 两次读 (头部+聚合, 号码列表), 不保证事务一致。
    /// 活动不存在返回 None。viewer_count 由调用方先行从成员表取得。
    async fn load_snapshot(
        &self,
        code: &str,
        viewer_count: u64,
    ) -> AppResult<Option<RaffleSnapshot>>;

    /// 售卖统计 (number_* 广播携带); 活动不存在返回 None, 由调用方置 0
    async fn sale_stats(&self, code: &str) -> AppResult<Option<SaleStats>>;
}

/// 头部 + 聚合计数, 一条按活动分组的语句。
/// 计数在 SQL 里显式 COALESCE + CAST 成 BIGINT, 解码处不再猜列类型。
#[derive(Debug, FromQueryResult)]
struct RaffleStatsRow {
    id: i64,
    code: String,
    name: String,
    status: String,
    pot_fires: i64,
    pot_coins: i64,
    participants: i64,
    sold_numbers: i64,
    reserved_numbers: i64,
}

#[derive(Debug, FromQueryResult)]
struct NumberRow {
    idx: i32,
    status: String,
    user_id: Option<i64>,
    username: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct SaleStatsRow {
    participants: i64,
    pot_fires: i64,
    pot_coins: i64,
    sold_numbers: i64,
}

const SNAPSHOT_STATS_SQL: &str = r#"
SELECT r.id,
       r.code,
       r.name,
       r.status,
       r.pot_fires,
       r.pot_coins,
       CAST(COALESCE(COUNT(DISTINCT rn.user_id) FILTER (WHERE rn.status = 'sold'), 0) AS BIGINT) AS participants,
       CAST(COALESCE(COUNT(rn.id) FILTER (WHERE rn.status = 'sold'), 0) AS BIGINT) AS sold_numbers,
       CAST(COALESCE(COUNT(rn.id) FILTER (WHERE rn.status = 'reserved'), 0) AS BIGINT) AS reserved_numbers
FROM raffles r
LEFT JOIN raffle_numbers rn ON rn.raffle_id = r.id
WHERE r.code = $1
GROUP BY r.id, r.code, r.name, r.status, r.pot_fires, r.pot_coins
"#;

const NUMBERS_SQL: &str = r#"
SELECT rn.idx,
       rn.status,
       rn.user_id,
       u.username
FROM raffle_numbers rn
LEFT JOIN users u ON u.id = rn.user_id
WHERE rn.raffle_id = $1
ORDER BY rn.idx ASC
"#;

const SALE_STATS_SQL: &str = r#"
SELECT CAST(COALESCE(COUNT(DISTINCT rn.user_id) FILTER (WHERE rn.status = 'sold'), 0) AS BIGINT) AS participants,
       CAST(COALESCE(r.pot_fires, 0) AS BIGINT) AS pot_fires,
       CAST(COALESCE(r.pot_coins, 0) AS BIGINT) AS pot_coins,
       CAST(COALESCE(COUNT(rn.id) FILTER (WHERE rn.status = 'sold'), 0) AS BIGINT) AS sold_numbers
FROM raffles r
LEFT JOIN raffle_numbers rn ON rn.raffle_id = r.id
WHERE r.code = $1
GROUP BY r.id, r.pot_fires, r.pot_coins
"#;

#[derive(Clone)]
pub struct RaffleQueryService {
    pool: std::sync::Arc<DatabaseConnection>,
}

impl RaffleQueryService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self {
            pool: std::sync::Arc::new(pool),
        }
    }
}

impl RaffleStore for RaffleQueryService {
    async fn find_by_code(&self, code: &str) -> AppResult<Option<raffle_entity::Model>> {
        let found = raffle_entity::Entity::find()
            .filter(raffle_entity::Column::Code.eq(code))
            .one(self.pool.as_ref())
            .await?;
        Ok(found)
    }

    async fn load_snapshot(
        &self,
        code: &str,
        viewer_count: u64,
    ) -> AppResult<Option<RaffleSnapshot>> {
        let stats = RaffleStatsRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            SNAPSHOT_STATS_SQL,
            [code.into()],
        ))
        .one(self.pool.as_ref())
        .await?;

        let Some(stats) = stats else {
            return Ok(None);
        };

        let numbers = NumberRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            NUMBERS_SQL,
            [stats.id.into()],
        ))
        .all(self.pool.as_ref())
        .await?;

        let numbers = numbers
            .into_iter()
            .map(|row| RaffleNumberView {
                idx: row.idx,
                status: row.status,
                user_id: row.user_id,
                username: row.username,
            })
            .collect();

        Ok(Some(RaffleSnapshot::from_parts(
            RaffleSummary {
                id: stats.id,
                code: stats.code,
                name: stats.name,
                status: stats.status,
                pot_fires: stats.pot_fires,
                pot_coins: stats.pot_coins,
            },
            stats.participants,
            stats.sold_numbers,
            stats.reserved_numbers,
            numbers,
            viewer_count,
        )))
    }

    async fn sale_stats(&self, code: &str) -> AppResult<Option<SaleStats>> {
        let row = SaleStatsRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            SALE_STATS_SQL,
            [code.into()],
        ))
        .one(self.pool.as_ref())
        .await?;

        Ok(row.map(|row| SaleStats {
            participants: row.participants,
            pot_fires: row.pot_fires,
            pot_coins: row.pot_coins,
            sold_numbers: row.sold_numbers,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{MockDatabase, Value};
    use std::collections::BTreeMap;

    type MockRow = BTreeMap<&'static str, Value>;

    fn stats_row() -> MockRow {
        BTreeMap::from([
            ("id", Value::BigInt(Some(7))),
            ("code", Value::String(Some(Box::new("RIFA-001".to_string())))),
            ("name", Value::String(Some(Box::new("Rifa de prueba".to_string())))),
            ("status", Value::String(Some(Box::new("active".to_string())))),
            ("pot_fires", Value::BigInt(Some(500))),
            ("pot_coins", Value::BigInt(Some(120))),
            ("participants", Value::BigInt(Some(2))),
            ("sold_numbers", Value::BigInt(Some(3))),
            ("reserved_numbers", Value::BigInt(Some(2))),
        ])
    }

    fn number_row(idx: i32, status: &str, user_id: Option<i64>) -> MockRow {
        BTreeMap::from([
            ("idx", Value::Int(Some(idx))),
            ("status", Value::String(Some(Box::new(status.to_string())))),
            ("user_id", Value::BigInt(user_id)),
            (
                "username",
                match user_id {
                    Some(id) => Value::String(Some(Box::new(format!("user{id}")))),
                    None => Value::String(None),
                },
            ),
        ])
    }

    #[tokio::test]
    async fn test_load_snapshot_assembles_both_reads() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([vec![stats_row()]])
            .append_query_results([vec![
                number_row(1, "sold", Some(5)),
                number_row(0, "sold", Some(4)),
                number_row(2, "reserved", Some(4)),
            ]])
            .into_connection();

        let service = RaffleQueryService::new(db);
        let snapshot = service.load_snapshot("RIFA-001", 3).await.unwrap().unwrap();

        assert_eq!(snapshot.raffle.code, "RIFA-001");
        assert_eq!(snapshot.sold_numbers, 3);
        assert_eq!(snapshot.reserved_numbers, 2);
        assert_eq!(snapshot.viewer_count, 3);
        // 排序不依赖驱动返回顺序
        let idxs: Vec<i32> = snapshot.numbers.iter().map(|n| n.idx).collect();
        assert_eq!(idxs, vec![0, 1, 2]);
        assert_eq!(snapshot.numbers[0].username.as_deref(), Some("user4"));
    }

    #[tokio::test]
    async fn test_load_snapshot_unknown_raffle_is_none() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<MockRow>::new()])
            .into_connection();

        let service = RaffleQueryService::new(db);
        let snapshot = service.load_snapshot("NO-EXISTE", 0).await.unwrap();
        assert!(snapshot.is_none());
    }

    #[tokio::test]
    async fn test_sale_stats_unknown_raffle_is_none() {
        let db = MockDatabase::new(DbBackend::Postgres)
            .append_query_results([Vec::<MockRow>::new()])
            .into_connection();

        let service = RaffleQueryService::new(db);
        assert!(service.sale_stats("NO-EXISTE").await.unwrap().is_none());
    }
}
