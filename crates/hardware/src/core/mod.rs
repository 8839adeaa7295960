//! Per-core hardware: register file, private cache and pipeline engine.

pub mod cache;
pub mod pipeline;
pub mod register_file;

pub use self::cache::Cache;
pub use self::pipeline::Pipeline;
pub use self::register_file::RegisterFile;
