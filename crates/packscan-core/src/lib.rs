//! Core engine for the packscan interactive scan front end.
//!
//! This crate provides the client-side orchestration for a multi-stage scan
//! simulation: concurrent timed animations, connectivity-aware cancellation,
//! a single remote analysis exchange, and a reload-surviving cooldown.
//!
//! # Architecture Overview
//!
//! The engine is organized around a few cooperating services:
//!
//! - **Scan orchestration**: session lifecycle and phase transitions
//! - **Timer registry**: ownership and mass cancellation of all delayed work
//! - **Connectivity monitor**: the single writer of the shared online flag
//! - **Animators**: typewriter line rendering and the percentage driver
//! - **Cooldown manager**: persisted deadline with a live countdown
//! - **Remote analysis client**: the one request/response boundary
//!
//! Rendering is abstracted behind [`surface::UiSurface`]; the engine itself
//! is headless and is exercised in tests through a recording double.

pub mod config;
pub mod connectivity;
pub mod context;
pub mod cooldown;
pub mod core_types;
pub mod errors;
pub mod jitter;
pub mod orchestrator;
pub mod progress;
pub mod remote;
pub mod surface;
pub mod timers;
pub mod typewriter;

pub use config::{AppConfig, ConfigLoader};
pub use connectivity::ConnectivityMonitor;
pub use context::ScanContext;
pub use cooldown::{CooldownManager, CooldownStore, FileCooldownStore, MemoryCooldownStore};
pub use core_types::{ResultOutcome, ScanKind, ScanPhase, Tier, UserConfig};
pub use errors::ScanError;
pub use jitter::{JitterSource, ThreadRngJitter};
pub use orchestrator::ScanOrchestrator;
pub use remote::{AnalysisClient, HttpAnalysisClient};
pub use surface::{CueKind, UiSurface, ViewKind};
pub use timers::TimerRegistry;

#[cfg(test)]
pub mod test_utils;
