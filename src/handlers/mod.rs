// handlers/mod.rs - HTTP handlers for the entity routes
//
// Every handler is a thin adapter: parse the path and body, hand the request
// to the entity pipeline, and turn the outcome into a response. Access
// control lives in the pipeline, not here.

pub mod data;
pub mod system;
