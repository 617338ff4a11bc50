pub mod api;
pub mod app;
pub mod config;

#[macro_use]
pub mod logging;

pub mod optimistic;
pub mod terminal;
pub mod ui;
pub mod watchdog;
