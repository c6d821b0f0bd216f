pub mod config;
pub mod health;
pub mod intake;
pub mod notifications;
pub mod proposals;
pub mod submissions;
