pub mod client;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod ctl;
mod errors;
pub mod proto;
pub mod spawn;
pub mod utils;

pub use client::*;
pub use cluster::*;
pub use config::*;
pub use ctl::*;
pub use errors::*;
pub use spawn::*;
pub use utils::*;
