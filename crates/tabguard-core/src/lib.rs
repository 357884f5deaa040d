//! tabguard-core: Core library for TabGuard
//!
//! Navigation-loop protection for multi-tab dashboard shells. Every tab
//! activation request flows through a single guard that throttles rapid
//! switching, confirms and breaks navigation loops, and serializes the
//! navigation side effects:
//!
//! ```text
//! Tab request → ThrottleTracker → CircuitBreaker → NavigationSequencing
//!                     ↓                 ↓                  ↓
//!             exponential delay   cooldown stop      single flight +
//!                                 + safe fallback    newest-wins deferral
//! ```
//!
//! # Modules
//!
//! - `guard`: The guard entry point and the injected capability traits
//! - `throttle`: Sliding-window attempt tracking and exponential throttling
//! - `circuit_breaker`: Cooldown latch that suspends navigation after a loop
//! - `session`: Single-flight navigation session with newest-wins deferral
//! - `tabs`: Tab identity and caller-declared routing properties
//! - `events`: Navigation outcomes and the notification surface
//! - `clock`: Injected monotonic time source
//! - `config`: Tuning knobs for windows, thresholds, and delays
//! - `logging`: `tracing` subscriber setup
//! - `error`: Error types
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod circuit_breaker;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod guard;
pub mod logging;
pub mod session;
pub mod tabs;
pub mod throttle;
