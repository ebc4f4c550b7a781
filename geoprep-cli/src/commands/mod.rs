//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`tiles`] - List the tile grid with present/missing status
//! - [`fetch`] - Download elevation tiles or boundary datasets
//! - [`process`] - Unpack tiles and run the elevation stages
//! - [`convert`] - Convert boundary shapefiles to GeoJSON
//! - [`events`] - Convert the campaign timeline to events GeoJSON
//! - [`validate`] - Check artifacts and report readiness
//! - [`config`] - Configuration management (path, show, init)

pub mod common;
pub mod config;
pub mod convert;
pub mod events;
pub mod fetch;
pub mod process;
pub mod tiles;
pub mod validate;
