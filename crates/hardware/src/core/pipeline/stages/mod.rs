pub mod decode;
pub mod execute;
pub mod fetch;
pub mod memory_access;
pub mod write_back;
