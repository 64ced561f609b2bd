use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use mundoxyz_realtime::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    realtime::{RaffleRoomServer, RoomHub, RoomRegistry},
    services::RaffleQueryService,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移 (生产 schema 由平台主服务维护, 这里兜底本地环境)
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务 (与平台共享签名密钥, 本服务只校验)
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 创建服务: 只读查询 + 房间成员表 + 广播通道, 统一注入事件路由
    let query_service = RaffleQueryService::new(pool);
    let room_server = RaffleRoomServer::new(query_service, RoomRegistry::new(), RoomHub::new());

    let realtime_config = config.realtime.clone();

    // 启动HTTP服务器
    log::info!(
        "Starting realtime gateway at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(room_server.clone()))
            .app_data(web::Data::new(realtime_config.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .configure(handlers::ws_config)
            .configure(handlers::notify_config)
            .service(web::scope("/api/v1").configure(handlers::raffle_config))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
