//! Route modules for the PDF rendering service

pub mod health;
pub mod pdf;
