//! WebSocket relay for collaborative editing rooms

mod actor;
mod coordinator;
mod groups;
mod messages;
mod rooms;
mod server;
mod types;

pub use actor::CoordinatorHandle;
pub use coordinator::Coordinator;
pub use groups::Groups;
pub use messages::{ClientEvent, ServerEvent};
pub use rooms::RoomRegistry;
pub use server::RelayServer;
pub use types::{ClientId, Joined, OutboundMessage, RelayError, RoomId, Session};
