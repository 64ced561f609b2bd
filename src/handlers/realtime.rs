use crate::config::RealtimeConfig;
use crate::error::AppError;
use crate::realtime::{RaffleRoomServer, SessionHandle, run_session};
use crate::services::RaffleQueryService;
use crate::utils::JwtService;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use tokio::sync::mpsc::unbounded_channel;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// WebSocket 升级入口。
/// 鉴权在升级前完成: 浏览器客户端把访问令牌放查询参数 `?token=`,
/// 非浏览器客户端也可以走 Authorization 头。校验通过后用户身份绑定到
/// 连接, 之后的事件 handler 不再做身份判断 (带外鉴权)。
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    query: web::Query<WsQuery>,
    jwt_service: web::Data<JwtService>,
    server: web::Data<RaffleRoomServer<RaffleQueryService>>,
    realtime_cfg: web::Data<RealtimeConfig>,
) -> actix_web::Result<HttpResponse> {
    let token = query
        .into_inner()
        .token
        .or_else(|| bearer_token(&req))
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))?;
    let claims = jwt_service.verify_access_token(&token)?;
    let user_id = claims.user_id()?;

    let (response, session, stream) = actix_ws::handle(&req, stream)?;

    let (tx, rx) = unbounded_channel();
    let handle = SessionHandle {
        conn_id: Uuid::new_v4(),
        user_id,
        tx,
    };

    actix_web::rt::spawn(run_session(
        server.get_ref().clone(),
        session,
        stream,
        handle,
        rx,
        realtime_cfg.get_ref().clone(),
    ));

    Ok(response)
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// 路由配置
pub fn ws_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws_connect));
}
