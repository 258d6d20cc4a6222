//! # Tidebreak Engine
//!
//! Headless driver for Tidebreak island battles.
//!
//! This crate ties the gameplay systems together over the in-memory island:
//! - Config: run settings and gameplay tuning from `tidebreak.toml`
//! - Timing: fixed-step accumulator
//! - Hooks: logged stand-ins for level flow, HUD and presentation
//! - Battle: the frame loop and its summary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod battle;
pub mod config;
pub mod hooks;
pub mod timing;


pub use battle::{Battle, BattleSummary};
pub use config::SimConfig;
