//! Network front ends: the sampling responder and the optional admin endpoint

pub mod http;
pub mod tcp;
