//! API Routes
//!
//! Route handlers organized by functionality.

pub mod celebrations;
pub mod dashboard;
pub mod debug;
pub mod health;
pub mod poll;
