use crate::models::{ApiResponse, RaffleSnapshot};
use crate::realtime::RaffleRoomServer;
use crate::services::RaffleQueryService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/api/v1/raffles/{code}/snapshot",
    tag = "raffle",
    params(
        ("code" = String, Path, description = "活动编号")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取活动快照成功", body = RaffleSnapshot),
        (status = 404, description = "活动不存在"),
        (status = 401, description = "未授权")
    )
)]
/// 活动快照的 HTTP 版本, 与 socket request_update 同一条构建路径。
/// 轮询客户端用; 在线人数按当前实例的房间成员表取值。
pub async fn get_snapshot(
    server: web::Data<RaffleRoomServer<RaffleQueryService>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let code = path.into_inner();
    match server.snapshot_for(&code).await {
        Ok(snapshot) => Ok(HttpResponse::Ok().json(ApiResponse::success(snapshot))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn raffle_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/raffles").route("/{code}/snapshot", web::get().to(get_snapshot)),
    );
}
