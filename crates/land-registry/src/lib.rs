//! Land Registry - Application Library
//!
//! Integrates the track and record logic from `land-track-lib` with settings,
//! logging, async file loading and a JSON record store to form the
//! `land-registry` command-line tool.

pub mod app;
