//! kswatch command line
//!
//! Offline front end for the detector: replays a CSV of recorded metric
//! samples window by window and inspects what the detector persisted.

pub mod commands;
pub mod router;
pub mod samples;
