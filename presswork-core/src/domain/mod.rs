//! Core domain types
//!
//! This module contains the core domain structures used across Presswork
//! services. These types represent the fundamental business entities and are
//! shared between the dashboard/queue side (persistence) and the worker
//! (execution).

pub mod item;
pub mod job;
pub mod layout;
