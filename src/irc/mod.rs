//! IRC client.
//!
//! - [`lifecycle`]: the connection loop that owns the transport
//! - [`dispatch`]: rules run against every inbound line
//! - [`session`]: state shared by handlers, the loop and [`IrcHandle`]
//! - [`operators`]: channel operator tracking
//! - [`queue`]: the two-lane outbound queue
//! - [`store`]: message id persistence
//! - [`transport`]: plaintext/TLS streams and the [`Connector`] seam

pub mod dispatch;
mod handle;
pub mod inbound;
pub mod lifecycle;
pub mod operators;
pub mod queue;
pub mod session;
pub mod store;
pub mod transport;

pub use dispatch::{DispatchRule, DispatchTable};
pub use handle::IrcHandle;
pub use inbound::{InboundHandler, InboundMessage, MessageKind};
pub use lifecycle::{IrcClient, LifecycleTimings};
pub use operators::OperatorTracker;
pub use queue::{Lane, Outbox};
pub use session::{Identity, Session};
pub use store::{MessageStore, StoredRef};
pub use transport::{Connector, IrcConnector, IrcStream};
