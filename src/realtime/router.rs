use crate::error::{AppError, AppResult};
use crate::models::{ClientMessage, RaffleSnapshot, SaleStats, ServerMessage};
use crate::realtime::{RoomHub, RoomRegistry};
use crate::services::RaffleStore;
use crate::utils::validate_raffle_code;
use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// 一条已鉴权的连接。用户身份在升级握手时由 JWT 校验得出,
/// 事件 handler 不再做身份判断。
#[derive(Clone)]
pub struct SessionHandle {
    pub conn_id: Uuid,
    pub user_id: i64,
    pub tx: UnboundedSender<ServerMessage>,
}

/// number_* 三类转发事件共用一条处理路径
#[derive(Clone, Copy, Debug)]
enum SaleEvent {
    Reserved,
    Purchased,
    Released,
}

/// 抽奖房间事件路由。每个入站事件一个 handler:
/// - join/reserve/purchase/release/request_update 的失败折叠成
///   发给触发连接的一条 error 事件, 绝不影响其它连接;
/// - leave/disconnect 尽力而为, 只记日志不回发
///   (对端很可能已经不在了)。
/// 成员表与广播通道都是构造注入, 持久化只经过 RaffleStore 只读契约。
#[derive(Clone)]
pub struct RaffleRoomServer<S: RaffleStore> {
    store: S,
    registry: RoomRegistry,
    hub: RoomHub,
}

impl<S: RaffleStore> RaffleRoomServer<S> {
    pub fn new(store: S, registry: RoomRegistry, hub: RoomHub) -> Self {
        Self {
            store,
            registry,
            hub,
        }
    }

    /// 入站事件分发 (session 泵解析出类型化事件后调用)
    pub async fn dispatch(&self, sess: &SessionHandle, message: ClientMessage) {
        match message {
            ClientMessage::Join { raffle_code } => self.join(sess, &raffle_code).await,
            ClientMessage::Leave { raffle_code } => self.leave(sess, &raffle_code),
            ClientMessage::ReserveNumber {
                raffle_code,
                number_idx,
            } => {
                self.relay_sale_event(sess, &raffle_code, number_idx, SaleEvent::Reserved)
                    .await
            }
            ClientMessage::PurchaseNumber {
                raffle_code,
                number_idx,
            } => {
                self.relay_sale_event(sess, &raffle_code, number_idx, SaleEvent::Purchased)
                    .await
            }
            ClientMessage::ReleaseNumber {
                raffle_code,
                number_idx,
            } => {
                self.relay_sale_event(sess, &raffle_code, number_idx, SaleEvent::Released)
                    .await
            }
            ClientMessage::RequestUpdate { raffle_code } => {
                self.request_update(sess, &raffle_code).await
            }
        }
    }

    pub async fn join(&self, sess: &SessionHandle, raffle_code: &str) {
        if let Err(err) = self.try_join(sess, raffle_code).await {
            self.report(sess, "join", err);
        }
    }

    async fn try_join(&self, sess: &SessionHandle, raffle_code: &str) -> AppResult<()> {
        let code = validate_raffle_code(raffle_code)?;
        self.store
            .find_by_code(code)
            .await?
            .ok_or_else(raffle_not_found)?;

        self.hub.subscribe(code, sess.conn_id, sess.tx.clone());
        let viewer_count = self.registry.add(code, sess.user_id);
        log::info!(
            "User {} joined raffle room {} ({} viewers)",
            sess.user_id,
            code,
            viewer_count
        );

        self.hub.broadcast(
            code,
            &ServerMessage::UserJoined {
                raffle_code: code.to_string(),
                user_id: sess.user_id,
                viewer_count,
            },
        );

        // 成员登记在广播之前、快照之前, 快照里带的是真实在线人数;
        // 快照会重读一遍活动头部, 与上面的存在性检查之间不做缓存
        let snapshot = self
            .store
            .load_snapshot(code, self.registry.count_for(code))
            .await?
            .ok_or_else(raffle_not_found)?;
        self.send_to(sess, ServerMessage::StateUpdate { snapshot });
        Ok(())
    }

    /// 尽力而为: 参数缺失或房间不存在都只记日志。
    /// 同一用户多端时一次 leave 就会把用户从集合里移除 (无引用计数)。
    pub fn leave(&self, sess: &SessionHandle, raffle_code: &str) {
        let code = raffle_code.trim();
        if code.is_empty() {
            log::info!("leave without raffle code from user {}", sess.user_id);
            return;
        }

        self.hub.unsubscribe(code, &sess.conn_id);
        let viewer_count = self.registry.remove(code, sess.user_id);
        self.hub.broadcast(
            code,
            &ServerMessage::UserLeft {
                raffle_code: code.to_string(),
                user_id: sess.user_id,
                viewer_count,
            },
        );
        log::info!(
            "User {} left raffle room {} ({} viewers)",
            sess.user_id,
            code,
            viewer_count
        );
    }

    async fn relay_sale_event(
        &self,
        sess: &SessionHandle,
        raffle_code: &str,
        number_idx: i32,
        event: SaleEvent,
    ) {
        if let Err(err) = self
            .try_relay_sale_event(sess, raffle_code, number_idx, event)
            .await
        {
            self.report(sess, "sale relay", err);
        }
    }

    /// 转发号码事件。写路径已在平台主服务落库, 这里只回读聚合再广播;
    /// 三类事件统一携带统计, 活动查不到时统计置 0 而不是拦截广播
    /// (保持与历史行为一致, 见 DESIGN.md 决策 2)。
    async fn try_relay_sale_event(
        &self,
        sess: &SessionHandle,
        raffle_code: &str,
        number_idx: i32,
        event: SaleEvent,
    ) -> AppResult<()> {
        let code = validate_raffle_code(raffle_code)?;
        if number_idx < 0 {
            return Err(AppError::ValidationError("Número inválido".to_string()));
        }

        let stats = self.store.sale_stats(code).await?.unwrap_or_default();
        let message = sale_message(event, code, number_idx, sess.user_id, stats);
        self.hub.broadcast(code, &message);
        Ok(())
    }

    pub async fn request_update(&self, sess: &SessionHandle, raffle_code: &str) {
        if let Err(err) = self.try_request_update(sess, raffle_code).await {
            self.report(sess, "request_update", err);
        }
    }

    /// join 的尾部, 不带成员副作用。没 join 过的连接也可以请求,
    /// 此时房间未被跟踪, 在线人数如实为 0。
    async fn try_request_update(&self, sess: &SessionHandle, raffle_code: &str) -> AppResult<()> {
        let code = validate_raffle_code(raffle_code)?;
        let snapshot = self
            .store
            .load_snapshot(code, self.registry.count_for(code))
            .await?
            .ok_or_else(raffle_not_found)?;
        self.send_to(sess, ServerMessage::StateUpdate { snapshot });
        Ok(())
    }

    /// 连接关闭 (主动断开 / 网络丢失 / 心跳超时)。
    /// 唯一会一次触碰多个房间的 handler: 逐房间移除用户并广播 user_left。
    pub fn disconnect(&self, sess: &SessionHandle) {
        self.hub.drop_conn(&sess.conn_id);
        let affected = self.registry.drain_user(sess.user_id);
        for (code, viewer_count) in &affected {
            self.hub.broadcast(
                code,
                &ServerMessage::UserLeft {
                    raffle_code: code.clone(),
                    user_id: sess.user_id,
                    viewer_count: *viewer_count,
                },
            );
        }
        log::info!(
            "User {} disconnected, left {} raffle room(s)",
            sess.user_id,
            affected.len()
        );
    }

    /// 平台侧入口: 活动状态变更通知。无人订阅时是空操作。
    pub fn notify_status_change(&self, raffle_code: &str, status: &str) -> usize {
        let delivered = self.hub.broadcast(
            raffle_code,
            &ServerMessage::StatusChanged {
                raffle_code: raffle_code.to_string(),
                status: status.to_string(),
                timestamp: Utc::now(),
            },
        );
        log::info!("Status change for raffle {raffle_code} delivered to {delivered} connection(s)");
        delivered
    }

    /// 平台侧入口: 开奖通知
    pub fn notify_winner(&self, raffle_code: &str, winner_id: i64, winning_number: i32) -> usize {
        let delivered = self.hub.broadcast(
            raffle_code,
            &ServerMessage::WinnerDrawn {
                raffle_code: raffle_code.to_string(),
                winner_id,
                winning_number,
                timestamp: Utc::now(),
            },
        );
        log::info!("Winner draw for raffle {raffle_code} delivered to {delivered} connection(s)");
        delivered
    }

    /// REST 快照 (轮询客户端用), 与 request_update 同一条构建路径
    pub async fn snapshot_for(&self, raffle_code: &str) -> AppResult<RaffleSnapshot> {
        let code = validate_raffle_code(raffle_code)?;
        self.store
            .load_snapshot(code, self.registry.count_for(code))
            .await?
            .ok_or_else(raffle_not_found)
    }

    fn send_to(&self, sess: &SessionHandle, message: ServerMessage) {
        // 对端已关闭时静默丢弃
        let _ = sess.tx.send(message);
    }

    /// handler 边界: 错误折叠成发给触发连接的一条 error 事件。
    /// 校验类只记 info, 未命中不记, 上游故障记 error 并隐藏细节。
    fn report(&self, sess: &SessionHandle, event: &str, err: AppError) {
        match &err {
            AppError::ValidationError(msg) => log::info!("{event} rejected: {msg}"),
            AppError::NotFound(_) => {}
            other => log::error!("{event} handler failed: {other}"),
        }
        self.send_to(sess, ServerMessage::error_event(&err));
    }
}

fn raffle_not_found() -> AppError {
    AppError::NotFound("Rifa no encontrada".to_string())
}

fn sale_message(
    event: SaleEvent,
    code: &str,
    number_idx: i32,
    user_id: i64,
    stats: SaleStats,
) -> ServerMessage {
    let raffle_code = code.to_string();
    let timestamp = Utc::now();
    match event {
        SaleEvent::Reserved => ServerMessage::NumberReserved {
            raffle_code,
            number_idx,
            user_id,
            stats,
            timestamp,
        },
        SaleEvent::Purchased => ServerMessage::NumberPurchased {
            raffle_code,
            number_idx,
            user_id,
            stats,
            timestamp,
        },
        SaleEvent::Released => ServerMessage::NumberReleased {
            raffle_code,
            number_idx,
            user_id,
            stats,
            timestamp,
        },
    }
}
