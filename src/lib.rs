//! chardb - character persistence for role-playing games
//!
//! This library crate exposes the configuration and demo driver of the
//! `chardb` binary for integration testing.

pub mod config;
pub mod demo;
