pub mod errors;
pub mod linker;
pub mod models;
pub mod ports;
pub mod registry;
pub mod service;
