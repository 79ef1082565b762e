//! Presswork Engine
//!
//! The document automation procedure executed once per job. It consumes a
//! payload file written by the worker, renders every production item from
//! its design template (field substitution with shrink-to-fit sizing, and
//! the two-pass base/mask separation for specialty metal stock), and writes
//! exactly one result or error file back into the spool.
//!
//! Rendering itself sits behind the [`export::ExportBackend`] trait so the
//! rasterizing host tool can be swapped without touching the state machine.

pub mod automation;
pub mod document;
pub mod export;
pub mod metrics;
pub mod separation;
pub mod substitute;
