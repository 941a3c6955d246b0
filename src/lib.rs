pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod report;
pub mod services;

#[cfg(test)]
mod test;
