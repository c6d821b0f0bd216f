pub mod config;
pub mod init;
pub mod intake;
pub mod migrate;
pub mod notify;
pub mod quote;
pub mod serve;
pub mod tiers;
