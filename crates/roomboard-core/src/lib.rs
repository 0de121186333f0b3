pub mod calendar;
pub mod config;
pub mod ipc;
pub mod schedule;
