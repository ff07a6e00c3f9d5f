pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod hours;
pub mod metrics;
pub mod refresh;
pub mod status;
pub mod telegram;
pub mod weather;
