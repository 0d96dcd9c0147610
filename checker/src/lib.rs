pub mod averager;
pub mod capacity;
pub mod check;
pub mod collector;
pub mod config;
pub mod error;
pub mod history;
pub mod httpd;
pub mod memory;
pub mod profile;
pub mod report;
pub mod verdict;

pub use check::{evaluate, CheckInputs};
pub use error::{CheckError, Result};
