//! FinMaster - Backend for a finance-education platform
//!
//! Accounts and sessions, articles, courses with video lessons and reviews,
//! a short-video reel feed, a product shop and a newsletter, served as a
//! JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
