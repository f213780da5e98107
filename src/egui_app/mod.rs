//! Egui-based interactive drill window (feature = "egui").
//!
//! [`DrillApp`] drives a [`crate::session::Session`] and draws the slot row
//! straight from the session's document, so what the window shows is exactly
//! what the projector wrote.

#![cfg(feature = "egui")]

mod state;
mod ui;

pub use state::{DrillApp, SlotCard, cards_in_order};
