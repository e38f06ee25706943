//! Karaoke ranking library - shared modules for all binaries.

pub mod catalog;
pub mod models;
pub mod normalize;
pub mod output;
pub mod progress;
pub mod providers;
pub mod safety;
pub mod scoring;
