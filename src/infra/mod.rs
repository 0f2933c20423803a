pub mod preflight;
pub mod process;
pub mod registry;
pub mod subprocess;
