// MedChat - medical chat assistant
// Library exports

// Core modules
pub mod cli;
pub mod config;
pub mod corpus;
pub mod model;
pub mod server;
pub mod training;
