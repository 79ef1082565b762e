//! Presswork Core
//!
//! Core types and abstractions for the Presswork print production system.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, ProductionItem, SheetLayout)
//! - DTOs: Data transfer objects for queue communication and the file-based
//!   worker/engine protocol
//! - Imposition: the pure sheet layout planner

pub mod domain;
pub mod dto;
pub mod imposition;
