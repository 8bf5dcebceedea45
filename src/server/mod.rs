//! In-process gRPC server for tests.
//!
//! Binds a loopback socket on an ephemeral or caller-chosen port, hosts the
//! scripted Datastore mock on a detached tokio task and exposes the chosen
//! address so clients can dial it with plaintext channels.

mod test_server;
pub use test_server::*;
