//! Background Tasks Module
//!
//! Long-running tasks that execute next to the request path.
//!
//! # Tasks
//! - Invalidation listener: one per backend replica, refreshes cached images
//!   the backend reports as changed

mod events;
mod invalidation;

pub use events::{parse_event_line, EventLineBuffer, DATA_PREFIX};
pub use invalidation::{spawn_listener, InvalidationListener, ListenerHandle, ListenerSettings};
