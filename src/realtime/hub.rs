use crate::models::ServerMessage;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// 房间广播通道: 活动编号 -> (连接ID -> 出站通道)。
/// 发送即忘: 对端已关闭导致的发送失败直接丢弃, 不影响其余订阅者,
/// 也不反压 handler。
#[derive(Clone, Default)]
pub struct RoomHub {
    rooms: Arc<DashMap<String, HashMap<Uuid, UnboundedSender<ServerMessage>>>>,
}

impl RoomHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, raffle_code: &str, conn_id: Uuid, tx: UnboundedSender<ServerMessage>) {
        self.rooms
            .entry(raffle_code.to_string())
            .or_default()
            .insert(conn_id, tx);
    }

    pub fn unsubscribe(&self, raffle_code: &str, conn_id: &Uuid) {
        if let Some(mut subscribers) = self.rooms.get_mut(raffle_code) {
            subscribers.remove(conn_id);
        }
        self.rooms
            .remove_if(raffle_code, |_, subscribers| subscribers.is_empty());
    }

    /// 断连路径: 把连接从所有房间移除
    pub fn drop_conn(&self, conn_id: &Uuid) {
        let mut emptied = Vec::new();
        for mut entry in self.rooms.iter_mut() {
            entry.value_mut().remove(conn_id);
            if entry.value().is_empty() {
                emptied.push(entry.key().clone());
            }
        }
        for code in emptied {
            self.rooms
                .remove_if(&code, |_, subscribers| subscribers.is_empty());
        }
    }

    /// 向房间内所有订阅连接广播; 无人订阅时是空操作。返回投递数。
    pub fn broadcast(&self, raffle_code: &str, message: &ServerMessage) -> usize {
        let Some(subscribers) = self.rooms.get(raffle_code) else {
            return 0;
        };
        let mut delivered = 0;
        for tx in subscribers.values() {
            if tx.send(message.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

    fn message() -> ServerMessage {
        ServerMessage::UserJoined {
            raffle_code: "RIFA-A".to_string(),
            user_id: 1,
            viewer_count: 1,
        }
    }

    fn subscriber(hub: &RoomHub, code: &str) -> (Uuid, UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = unbounded_channel();
        let conn_id = Uuid::new_v4();
        hub.subscribe(code, conn_id, tx);
        (conn_id, rx)
    }

    #[test]
    fn test_broadcast_is_room_scoped() {
        let hub = RoomHub::new();
        let (_, mut rx_a) = subscriber(&hub, "RIFA-A");
        let (_, mut rx_b) = subscriber(&hub, "RIFA-B");

        assert_eq!(hub.broadcast("RIFA-A", &message()), 1);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_to_empty_room_is_noop() {
        let hub = RoomHub::new();
        assert_eq!(hub.broadcast("NADIE", &message()), 0);
    }

    #[test]
    fn test_unsubscribe_prunes_empty_room() {
        let hub = RoomHub::new();
        let (conn_id, _rx) = subscriber(&hub, "RIFA-A");
        hub.unsubscribe("RIFA-A", &conn_id);
        assert!(!hub.rooms.contains_key("RIFA-A"));
    }

    #[test]
    fn test_drop_conn_leaves_other_subscribers() {
        let hub = RoomHub::new();
        let (conn_a, _rx_a) = subscriber(&hub, "RIFA-A");
        hub.subscribe("RIFA-B", conn_a, {
            let (tx, _rx) = unbounded_channel();
            tx
        });
        let (_, mut rx_other) = subscriber(&hub, "RIFA-A");

        hub.drop_conn(&conn_a);

        assert!(!hub.rooms.contains_key("RIFA-B"));
        assert_eq!(hub.broadcast("RIFA-A", &message()), 1);
        assert!(rx_other.try_recv().is_ok());
    }

    #[test]
    fn test_closed_receiver_is_skipped() {
        let hub = RoomHub::new();
        let (_, rx) = subscriber(&hub, "RIFA-A");
        drop(rx);
        let (_, mut rx_live) = subscriber(&hub, "RIFA-A");

        assert_eq!(hub.broadcast("RIFA-A", &message()), 1);
        assert!(rx_live.try_recv().is_ok());
    }
}
