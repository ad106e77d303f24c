//! vmforge Core
//!
//! Core types for the vmforge template generator.
//!
//! This crate contains:
//! - Domain types: template specifications, platform objects, pipeline
//!   stages and generation reports
//! - DTOs: request shapes exchanged with the control-plane client

pub mod domain;
pub mod dto;
