//! Event plumbing between background tasks and the UI loop.
//!
//! Background work never touches UI state directly. The connection manager
//! and export tasks publish [`AppEvent`]s through an [`EventSender`]; the UI
//! loop owns the single [`EventReceiver`] and applies each event to the
//! [`ChatApp`](crate::chat::ChatApp).
//!
//! ```text
//!   ConnectionManager ──┐
//!                       ├──▶ EventBus ──▶ UI loop ──▶ ChatApp
//!   export task ────────┘
//! ```

mod bus;
mod types;

pub use bus::{BusError, EventBus, EventReceiver, EventSender};
pub use types::*;
