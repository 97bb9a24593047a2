//! Internship postings and the student application workflow for campus placement.
//!
//! Identity records live in [`identity`], postings and applications in
//! [`workflows::placement`], and both sit on top of the record store defined in
//! [`storage`].

pub mod config;
pub mod error;
pub mod identity;
pub mod storage;
pub mod telemetry;
pub mod workflows;
