//! Sublingo - subtitle parsing and analysis for language learners
//!
//! Decodes SRT and WebVTT files into timed entries, then derives dialogues,
//! vocabulary statistics, a difficulty score and study recommendations from them.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod service;
pub mod subtitle;
pub mod workflow;
