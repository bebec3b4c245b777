pub mod app;
pub mod cli;
pub mod client;
pub mod config;
pub mod controller;
pub mod editor;
pub mod logging;
pub mod model;
pub mod output;
pub mod session;
pub mod theme;
pub mod utils;

#[cfg(test)]
mod tests;
