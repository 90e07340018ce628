// src/lib.rs

//! notice-watch: university notice page monitor library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod scheduler;
pub mod services;
pub mod storage;
pub mod utils;
