//! Core logic: authority state machine, reporter, links, runtime, API

mod api;
mod authority;
mod link;
mod reporter;
mod runtime;

pub use api::{create_router, run_server, AppState, Session};
pub use authority::{SpawnSink, SqueezeAuthority};
pub use link::{AuthorityLink, HttpRelayLink, QueueLink};
pub use reporter::{GestureReporter, PointSource, SharedPoint};
pub use runtime::AuthorityRuntime;
