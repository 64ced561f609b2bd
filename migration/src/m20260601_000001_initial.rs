use sea_orm_migration::prelude::*;

/// Users (用户表 - 仅实时网关需要的最小镜像)
#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    CreatedAt,
}

/// Raffles (抽奖活动表)
#[derive(DeriveIden)]
enum Raffles {
    Table,
    Id,
    Code,
    Name,
    Status,
    PotFires,
    PotCoins,
    CreatedAt,
    UpdatedAt,
}

/// Raffle Numbers (号码表 - 每个活动一行一个号码)
#[derive(DeriveIden)]
enum RaffleNumbers {
    Table,
    Id,
    RaffleId,
    Idx,
    Status,
    UserId,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 本服务只读这三张表, 生产环境的 schema 由平台主服务维护,
/// 这里的迁移仅用于本地开发与测试环境:
/// - raffles.code 全局唯一 (对外展示的活动编号)
/// - raffles.status / raffle_numbers.status 为平台侧维护的文本枚举
///   (pending/active/closed, available/reserved/sold), 网关不解释取值
/// - pot_fires / pot_coins 为双币种奖池 (虚拟币整数)
/// - raffle_numbers (raffle_id, idx) 唯一, idx 为活动内编号
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 抽奖活动表
        manager
            .create_table(
                Table::create()
                    .table(Raffles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Raffles::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Raffles::Code).string().not_null())
                    .col(ColumnDef::new(Raffles::Name).string().not_null())
                    .col(
                        ColumnDef::new(Raffles::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Raffles::PotFires)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Raffles::PotCoins)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Raffles::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Raffles::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_raffles_code")
                    .table(Raffles::Table)
                    .col(Raffles::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 号码表
        manager
            .create_table(
                Table::create()
                    .table(RaffleNumbers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RaffleNumbers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RaffleNumbers::RaffleId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RaffleNumbers::Idx).integer().not_null())
                    .col(
                        ColumnDef::new(RaffleNumbers::Status)
                            .string()
                            .not_null()
                            .default("available"),
                    )
                    .col(ColumnDef::new(RaffleNumbers::UserId).big_integer())
                    .col(
                        ColumnDef::new(RaffleNumbers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_raffle_numbers_raffle")
                            .from(RaffleNumbers::Table, RaffleNumbers::RaffleId)
                            .to(Raffles::Table, Raffles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_raffle_numbers_raffle_idx")
                    .table(RaffleNumbers::Table)
                    .col(RaffleNumbers::RaffleId)
                    .col(RaffleNumbers::Idx)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_raffle_numbers_user")
                    .table(RaffleNumbers::Table)
                    .col(RaffleNumbers::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RaffleNumbers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Raffles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
