pub mod health;
pub mod notify;
pub mod raffle;
pub mod realtime;

pub use health::health_config;
pub use notify::notify_config;
pub use raffle::raffle_config;
pub use realtime::ws_config;
