pub mod analyzer;
pub mod config;
pub mod lead;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod report;
pub mod source;
pub mod state;
pub mod utils;
