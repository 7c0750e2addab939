//! hark - open applications and launch routines by spoken or typed name.
//!
//! A name is resolved through the built-in system commands, then the apps
//! learned from earlier launches, then fuzzy correction and finally a
//! filesystem search. Routines open several apps in order.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  ┌──────────────┐
//! │     CLI     │  │ command loop │
//! └──────┬──────┘  └──────┬───────┘
//!        └────────┬───────┘
//!          ┌──────┴──────┐
//!          │   Routines  │
//!          └──────┬──────┘
//!          ┌──────┴──────┐
//!          │  AppOpener  │──── learned apps, activity log
//!          └──────┬──────┘
//!        ┌────────┴────────┐
//!  ┌─────┴──────┐   ┌──────┴─────┐
//!  │  Resolver  │   │  Launcher  │
//!  └────────────┘   └────────────┘
//! ```

pub mod cli;
pub mod config;
pub mod core;

pub use config::Config;
pub use core::{AppOpener, NameResolver, RoutineEngine};
