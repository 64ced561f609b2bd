use crate::config::RealtimeConfig;
use crate::models::{ClientMessage, ServerMessage};
use crate::realtime::{RaffleRoomServer, SessionHandle};
use crate::services::RaffleStore;
use actix_ws::{AggregatedMessage, MessageStream, Session};
use futures_util::StreamExt;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;

/// 单帧上限。事件载荷都是短 JSON, 超出即按协议错误断开。
const MAX_FRAME_SIZE: usize = 64 * 1024;

/// 每条连接一个泵任务:
/// - 入站帧解析成类型化事件后交给路由; 解析失败只回一条 error 事件
/// - 出站通道 (直发 + 房间广播共用) 逐条写回 socket
/// - 心跳 ping, 超时未见任何对端活动则按断连处理
/// 任务退出时统一走 disconnect 路径清理成员与订阅。
pub async fn run_session<S: RaffleStore>(
    server: RaffleRoomServer<S>,
    mut session: Session,
    stream: MessageStream,
    handle: SessionHandle,
    mut rx: UnboundedReceiver<ServerMessage>,
    cfg: RealtimeConfig,
) {
    let mut stream = stream
        .aggregate_continuations()
        .max_continuation_size(MAX_FRAME_SIZE);
    let mut heartbeat = tokio::time::interval(Duration::from_secs(cfg.heartbeat_interval_secs));
    let client_timeout = Duration::from_secs(cfg.client_timeout_secs);
    let mut last_seen = Instant::now();

    log::info!(
        "WS session {} opened for user {}",
        handle.conn_id,
        handle.user_id
    );

    loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(AggregatedMessage::Text(text))) => {
                        last_seen = Instant::now();
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(event) => server.dispatch(&handle, event).await,
                            Err(err) => {
                                log::info!(
                                    "Unparseable frame on session {}: {err}",
                                    handle.conn_id
                                );
                                let _ = handle.tx.send(ServerMessage::invalid_message());
                            }
                        }
                    }
                    Some(Ok(AggregatedMessage::Binary(_))) => {
                        let _ = handle.tx.send(ServerMessage::invalid_message());
                    }
                    Some(Ok(AggregatedMessage::Ping(payload))) => {
                        last_seen = Instant::now();
                        if session.pong(&payload).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(AggregatedMessage::Pong(_))) => {
                        last_seen = Instant::now();
                    }
                    Some(Ok(AggregatedMessage::Close(_))) | None => break,
                    Some(Err(err)) => {
                        log::info!("WS protocol error on session {}: {err}", handle.conn_id);
                        break;
                    }
                }
            }
            outbound = rx.recv() => {
                match outbound {
                    Some(message) => match serde_json::to_string(&message) {
                        Ok(payload) => {
                            if session.text(payload).await.is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            log::error!("Failed to encode outbound event: {err}");
                        }
                    },
                    None => break,
                }
            }
            _ = heartbeat.tick() => {
                if last_seen.elapsed() > client_timeout {
                    log::info!("WS session {} timed out", handle.conn_id);
                    break;
                }
                if session.ping(b"").await.is_err() {
                    break;
                }
            }
        }
    }

    server.disconnect(&handle);
    let _ = session.close(None).await;
    log::info!("WS session {} closed", handle.conn_id);
}
