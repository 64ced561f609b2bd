pub mod jwt;
pub mod raffle_code;

pub use jwt::*;
pub use raffle_code::validate_raffle_code;
