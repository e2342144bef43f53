pub mod audit;
pub mod capability;
pub mod clarify;
pub mod config;
pub mod determinism;
pub mod filter;
pub mod mapper;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod render;

pub mod error;
