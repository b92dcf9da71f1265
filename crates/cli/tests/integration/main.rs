//! End-to-end tests for the gdxb build pipeline.

#![cfg(unix)]

mod common;
