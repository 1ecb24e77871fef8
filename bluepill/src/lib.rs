#![no_std]

pub mod config;
pub mod hardware;
pub mod logger;
