pub mod app_state;
pub mod config;
pub mod constants;
pub mod response;

pub mod common {
    pub use super::app_state::*;
    pub use super::config::*;
    pub use super::constants::*;
    pub use super::response::*;
}
