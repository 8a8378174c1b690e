//! Attendance & payroll engine for a multi-tenant workforce backend.
//!
//! The punch state machine, geofence admission, attendance log queries and
//! payroll calculation live in [`engine`]; [`api`] and [`routes`] expose them
//! over actix-web, and [`store`] holds the persistence seam.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod engine;
pub mod error;
pub mod model;
pub mod models;
pub mod routes;
pub mod store;
