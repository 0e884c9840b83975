//! HTTP handlers

pub mod health;
pub mod dashboard;
pub mod queries;
pub mod predictions;
