use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 平台侧触发的状态变更通知请求体
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    #[schema(example = "closed")]
    pub status: String,
}

/// 开奖通知请求体
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WinnerRequest {
    pub winner_id: i64,
    pub winning_number: i32,
}

/// 通知接口的响应体 (是否有人在房间里收到了广播)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifyResponse {
    pub delivered_to: usize,
}
