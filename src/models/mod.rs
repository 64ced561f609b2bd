pub mod common;
pub mod notify;
pub mod raffle;
pub mod ws;

pub use common::*;
pub use notify::*;
pub use raffle::*;
pub use ws::*;
