pub mod raffle_query_service;

pub use raffle_query_service::*;
