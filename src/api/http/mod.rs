// src/api/http/mod.rs

pub mod conversation;
pub mod handlers;
pub mod router;
pub mod teams;

pub use router::http_router;
