//! A map widget for rating the restaurants around the zoo.
//!
//! The rating core (storage, aggregation, popup markup and the click state
//! machine) is plain Rust; [`web`] hosts it on a Leaflet map in the browser.

pub mod config;
pub mod controller;
pub mod data;
pub mod db;
pub mod map;
pub mod popup;
pub mod selection;
pub mod web;
