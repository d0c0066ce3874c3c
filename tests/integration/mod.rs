//! Integration tests for healthz
//!
//! Each test binds its own probe server on 127.0.0.1:0 and talks to it over
//! real TCP with reqwest.
//!
//! Run with: cargo test --test integration

mod helpers;

mod lifecycle;
mod metrics;
mod probes;
