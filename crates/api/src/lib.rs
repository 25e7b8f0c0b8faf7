//! HTTP query facade plus the process wiring for the warehouse pipeline.

pub mod app;
