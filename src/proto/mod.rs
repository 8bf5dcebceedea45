//! Protocol Buffer definitions and generated code for the Datastore RPC
//! surface.
//!
//! The Rust types here are generated from `proto/datastore.proto` by
//! [`tonic-build`] at compile time.

pub mod v1 {
    tonic::include_proto!("datastore.v1");
}
