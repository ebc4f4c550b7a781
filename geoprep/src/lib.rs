//! GeoPrep - geospatial data preparation for campaign maps
//!
//! The library covers the whole preparation pipeline:
//!
//! - [`grid`] enumerates the fixed-size elevation tiles covering a region
//! - [`fetch`] and [`acquisition`] download tiles and datasets with plan,
//!   skip-existing, retry and bounded parallelism
//! - [`toolchain`] and [`stages`] drive external GDAL tools through a
//!   dependency-ordered graph of memoized stages
//! - [`timeline`] turns the campaign timeline into an events collection
//! - [`validation`] checks the produced artifacts and renders a readiness
//!   verdict
//!
//! [`config`] and [`logging`] provide the ambient settings and tracing setup
//! shared by the CLI.

pub mod acquisition;
pub mod cancel;
pub mod config;
pub mod fetch;
pub mod grid;
pub mod logging;
pub mod stages;
pub mod timeline;
pub mod toolchain;
pub mod validation;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
