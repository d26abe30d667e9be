pub mod cache;
pub mod client;
pub mod config;
pub mod controller;
pub mod directory;
pub mod error;
pub mod http;
pub mod invoice;
pub mod qr;
pub mod resolver;
