use crate::error::AppError;
use crate::models::{RaffleSnapshot, SaleStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 入站事件。socket 文本帧为 {"type": "..."} 标签的 JSON,
/// 字段在边界一次性反序列化校验, handler 内不再接触裸 JSON。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    Join { raffle_code: String },
    #[serde(rename_all = "camelCase")]
    Leave { raffle_code: String },
    #[serde(rename_all = "camelCase")]
    ReserveNumber { raffle_code: String, number_idx: i32 },
    #[serde(rename_all = "camelCase")]
    PurchaseNumber { raffle_code: String, number_idx: i32 },
    #[serde(rename_all = "camelCase")]
    ReleaseNumber { raffle_code: String, number_idx: i32 },
    #[serde(rename_all = "camelCase")]
    RequestUpdate { raffle_code: String },
}

/// 出站事件。房间广播与单连接下发共用同一个枚举。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    UserJoined {
        raffle_code: String,
        user_id: i64,
        viewer_count: u64,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft {
        raffle_code: String,
        user_id: i64,
        viewer_count: u64,
    },
    StateUpdate { snapshot: RaffleSnapshot },
    #[serde(rename_all = "camelCase")]
    NumberReserved {
        raffle_code: String,
        number_idx: i32,
        user_id: i64,
        stats: SaleStats,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    NumberPurchased {
        raffle_code: String,
        number_idx: i32,
        user_id: i64,
        stats: SaleStats,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    NumberReleased {
        raffle_code: String,
        number_idx: i32,
        user_id: i64,
        stats: SaleStats,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        raffle_code: String,
        status: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    WinnerDrawn {
        raffle_code: String,
        winner_id: i64,
        winning_number: i32,
        timestamp: DateTime<Utc>,
    },
    Error { code: String, message: String },
}

impl ServerMessage {
    /// 由 AppError 构造 error 事件 (静态西语文案 + 稳定错误码)
    pub fn error_event(err: &AppError) -> Self {
        let (code, message) = err.ws_event_parts();
        ServerMessage::Error {
            code: code.to_string(),
            message,
        }
    }

    /// 帧级错误 (解析失败 / 二进制帧)
    pub fn invalid_message() -> Self {
        ServerMessage::Error {
            code: "INVALID_MESSAGE".to_string(),
            message: "Mensaje inválido".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join_frame() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join","raffleCode":"RIFA-001"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Join {
                raffle_code: "RIFA-001".to_string()
            }
        );
    }

    #[test]
    fn test_parse_reserve_number_frame() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"reserve_number","raffleCode":"RIFA-001","numberIdx":42}"#)
                .unwrap();
        assert_eq!(
            msg,
            ClientMessage::ReserveNumber {
                raffle_code: "RIFA-001".to_string(),
                number_idx: 42
            }
        );
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let parsed = serde_json::from_str::<ClientMessage>(r#"{"type":"spin","raffleCode":"X"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let parsed = serde_json::from_str::<ClientMessage>(r#"{"type":"purchase_number","raffleCode":"X"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_user_joined_wire_shape() {
        let msg = ServerMessage::UserJoined {
            raffle_code: "RIFA-001".to_string(),
            user_id: 9,
            viewer_count: 3,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "user_joined");
        assert_eq!(value["raffleCode"], "RIFA-001");
        assert_eq!(value["userId"], 9);
        assert_eq!(value["viewerCount"], 3);
    }

    #[test]
    fn test_error_event_from_not_found() {
        let err = AppError::NotFound("Rifa no encontrada".to_string());
        let value = serde_json::to_value(ServerMessage::error_event(&err)).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["code"], "NOT_FOUND");
        assert_eq!(value["message"], "Rifa no encontrada");
    }

    #[test]
    fn test_error_event_hides_internal_detail() {
        let err = AppError::InternalError("pool exhausted on pg-7".to_string());
        let value = serde_json::to_value(ServerMessage::error_event(&err)).unwrap();
        assert_eq!(value["code"], "INTERNAL_ERROR");
        assert_eq!(value["message"], "Error interno del servidor");
    }
}
