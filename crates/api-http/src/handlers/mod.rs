//! Route handlers

pub mod admin;
pub mod exports;
pub mod health;
