//! Slot/subslot synchronization and visibility engine for sentence drills.
//!
//! Example sentences are decomposed into ten grammatical slots, each of which
//! may hold ten subslots. This crate keeps a tree model of one sentence built
//! from a JSON example set, projects it onto a container document, and keeps
//! user-chosen per-channel show/hide flags intact across randomization,
//! subslot expansion and reloads.
//!
//! The binary `rephrase` renders presets to HTML snapshots and validates
//! preset files.

pub mod collab;
pub mod config;
pub mod controller;
pub mod controls;
pub mod dom;
pub mod error;
pub mod model;
pub mod prefs;
pub mod projector;
pub mod session;
pub mod store;
pub mod tree;
pub mod visibility;

// Optional GUI/egui functionality lives behind the `egui` feature flag.
#[cfg(feature = "egui")]
pub mod egui_app;

pub use error::CoreError;
pub use session::Session;
