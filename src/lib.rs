//! The library code for the `generate-go-redirect` tool, which publishes a
//! vanity Go import domain as a tree of static HTML pages. Each page carries
//! the `go-import` meta tag (and a `go-source` tag) which points Go tooling at
//! the repository actually hosting a package.
//!
//! A run is a straight pipeline over an explicit [`config::Config`]:
//!
//! 1. Parsing records from a delimited or JSON file ([`crate::parser`] into
//!    [`crate::record`])
//! 2. Rendering one page per record from the embedded template
//!    ([`crate::template`])
//! 3. Writing the pages, their nested-module copies and an optional `CNAME`
//!    file to disk ([`crate::write`])
//!
//! [`build::generate`] stitches the steps together and stops at the first
//! error.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod cli;
pub mod config;
pub mod logging;
pub mod parser;
pub mod record;
pub mod template;
pub mod write;
