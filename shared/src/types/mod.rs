//! Data model for sampling strategy documents

pub mod strategy;
