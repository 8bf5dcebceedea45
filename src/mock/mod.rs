//! Scripted mock of the Datastore service for validating client requests.
//!
//! The mock answers every service method from an ordered expectation queue:
//! each incoming call consumes one entry, optionally compares the request it
//! carried against the scripted one, and returns the canned response or
//! error. Tests script the queue up front, drive the client, then assert
//! the queue drained.

mod mock_datastore;
pub use mock_datastore::*;
