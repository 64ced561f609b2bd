pub mod hub;
pub mod registry;
pub mod router;
pub mod session;

pub use hub::RoomHub;
pub use registry::RoomRegistry;
pub use router::{RaffleRoomServer, SessionHandle};
pub use session::run_session;
