use crate::error::AppError;
use crate::models::{ApiResponse, NotifyResponse, StatusChangeRequest, WinnerRequest};
use crate::realtime::RaffleRoomServer;
use crate::services::RaffleQueryService;
use crate::utils::validate_raffle_code;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/internal/raffles/{code}/status",
    tag = "notify",
    params(
        ("code" = String, Path, description = "活动编号")
    ),
    request_body = StatusChangeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "状态变更已广播", body = NotifyResponse),
        (status = 400, description = "参数错误"),
        (status = 401, description = "未授权")
    )
)]
/// 平台侧触发的状态变更通知。
/// 发送即忘: 无人订阅时是空操作, 不校验活动存在性。
pub async fn notify_status(
    server: web::Data<RaffleRoomServer<RaffleQueryService>>,
    path: web::Path<String>,
    body: web::Json<StatusChangeRequest>,
) -> Result<HttpResponse> {
    let code = path.into_inner();
    if let Err(e) = validate_raffle_code(&code) {
        return Ok(e.error_response());
    }
    if body.status.trim().is_empty() {
        return Ok(AppError::ValidationError("Status is required".to_string()).error_response());
    }

    let delivered = server.notify_status_change(code.trim(), body.status.trim());
    Ok(HttpResponse::Ok().json(ApiResponse::success(NotifyResponse {
        delivered_to: delivered,
    })))
}

#[utoipa::path(
    post,
    path = "/internal/raffles/{code}/winner",
    tag = "notify",
    params(
        ("code" = String, Path, description = "活动编号")
    ),
    request_body = WinnerRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "开奖已广播", body = NotifyResponse),
        (status = 400, description = "参数错误"),
        (status = 401, description = "未授权")
    )
)]
/// 平台侧触发的开奖通知
pub async fn notify_winner(
    server: web::Data<RaffleRoomServer<RaffleQueryService>>,
    path: web::Path<String>,
    body: web::Json<WinnerRequest>,
) -> Result<HttpResponse> {
    let code = path.into_inner();
    if let Err(e) = validate_raffle_code(&code) {
        return Ok(e.error_response());
    }
    if body.winning_number < 0 {
        return Ok(
            AppError::ValidationError("Winning number must be non-negative".to_string())
                .error_response(),
        );
    }

    let delivered = server.notify_winner(code.trim(), body.winner_id, body.winning_number);
    Ok(HttpResponse::Ok().json(ApiResponse::success(NotifyResponse {
        delivered_to: delivered,
    })))
}

/// 路由配置 (挂在 /internal 下, 经过鉴权中间件)
pub fn notify_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/internal/raffles")
            .route("/{code}/status", web::post().to(notify_status))
            .route("/{code}/winner", web::post().to(notify_winner)),
    );
}
