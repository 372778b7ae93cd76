//! A tiny batch shell that runs external programs serially or in parallel.
//!
//! This crate reads lines of text, interprets each one as either a control
//! directive (`exit`, `SERIAL <file>`, `PARALLEL <file>`) or an external
//! program invocation, and executes programs one-at-a-time or concurrently,
//! reporting exit codes in launch order. It is intentionally small and easy
//! to read, suitable for coursework and experiments with process management.
//!
//! The main entry point is [`Session`], which drives the read-classify-
//! dispatch loop over any [`io_adapters::LineSource`]. The public modules
//! [`env`], [`external`] and [`io_adapters`] expose the environment
//! snapshot, the process launcher and the line-source adapters.

pub mod env;
pub mod external;
pub mod io_adapters;
mod interpreter;
mod lexer;
mod parser;

pub use interpreter::{Mode, Session};
