/*
 * Responsibility
 * - v1 public surface (routes() re-export etc.)
 */
pub mod dto;
pub mod handlers;
mod routes;

pub use routes::routes;
