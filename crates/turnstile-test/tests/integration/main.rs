#![allow(clippy::unused_async)]
//! Integration tests for the authentication pipeline over HTTP.
//!
//! These tests run the Salvo app against seeded in-memory stores and an
//! in-memory Casbin policy set, then issue real HTTP requests.

mod helpers;

mod content;
mod forms;
mod protocols;
mod windows;
