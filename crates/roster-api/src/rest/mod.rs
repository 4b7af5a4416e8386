//! REST surface: router, middleware and handlers

pub mod handlers;
pub mod middleware;
pub mod router;
