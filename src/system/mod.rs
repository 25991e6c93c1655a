pub mod collector;
pub mod cpu;
pub mod error;
pub mod procfs;
pub mod process;
pub mod ranking;
pub mod snapshot;
