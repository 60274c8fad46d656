//! # tilecast-host: console host for tilecast sessions
//!
//! Runs one streaming session per client against the synthetic test
//! pattern backend and a logging map surface.
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | `config`   | TOML configuration with defaults and clamping        |
//! | `registry` | Per-client session registry and input routing        |
//! | `surface`  | `LogSurface`, a tracing-backed map surface           |

pub mod config;
pub mod registry;
pub mod surface;
