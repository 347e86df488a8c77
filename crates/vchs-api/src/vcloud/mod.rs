// Per-VDC vCloud Director API.

pub mod client;

pub use client::VcloudClient;
