//! Data Transfer Objects
//!
//! This module contains DTOs used for communication between Presswork
//! services: the HTTP boundary with the queue service and the file-based
//! protocol between the worker and the document engine.

pub mod ipc;
pub mod job;
pub mod worker;
