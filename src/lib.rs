pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod lesson;
pub mod practice;
pub mod session;
pub mod state;
pub mod validation;

#[cfg(test)]
pub mod testing;
