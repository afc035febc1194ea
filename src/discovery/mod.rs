//! Periodic remote-state discovery.

pub mod poller;
