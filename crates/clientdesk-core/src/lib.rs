pub mod config;
pub mod db;
pub mod error;
pub mod intake;
pub mod io;
pub mod migrations;
pub mod notification;
pub mod paths;
pub mod proposal;
pub mod submission;

pub use error::{ClientdeskError, Result};
