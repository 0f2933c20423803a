pub mod allocator;
pub mod args;
pub mod cancel;
pub mod console;
pub mod constants;
pub mod filter;
pub mod logging;
pub mod report;
pub mod run;
pub mod services;
pub mod sink;
pub mod transform;

#[cfg(test)]
mod transform_tests;
