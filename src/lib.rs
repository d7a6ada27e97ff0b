//! surveykit: survey definition trees, response export normalization and
//! frequency tabulation.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
