//! # herald-client
//!
//! Reconnecting WebSocket client for the Herald realtime protocol.
//!
//! The client presents a fixed, caller-supplied identity on every attempt and
//! leaves admission to the server. Reconnects are paced by a 5-second floor
//! measured from each attempt's start, with a latch guaranteeing no
//! overlapping retry chains.

#![deny(unsafe_code)]

pub mod client;
pub mod gate;

pub use client::{ClientConfig, ClientEvent, ReconnectingClient, random_identifier};
pub use gate::{ConnectionPhase, MIN_REJOIN_DELAY, RejoinGate};
