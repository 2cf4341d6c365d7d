//! Tooling primitives for deterministic NPC AI.
//!
//! Trace events are plain data recorded during simulation; rendering and inspection live in
//! whatever consumes the log.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{NullTraceSink, TraceEvent, TraceLog, TraceSink, Tracer, VecTraceSink};
