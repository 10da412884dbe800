pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod filters;
pub mod models;
pub mod output;
pub mod render;
pub mod rfp;
pub mod search;
pub mod session;
pub mod tenders;
pub mod ui;

#[cfg(test)]
mod tests;
