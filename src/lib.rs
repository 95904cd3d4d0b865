//! mlsim backend library
//!
//! Upload a time-ordered dataset, carve it into train / test / simulate
//! windows, fit a classifier and replay the test window as a live feed.

pub mod api;
pub mod classifier;
pub mod config;
pub mod features;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod table;
