mod database {
    pub mod actions;
    pub mod associations;
    pub mod error;
    pub mod form;
    pub mod pagination;
    pub mod schema;
    pub mod shopping_list;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
pub mod api;
pub mod config;
mod constants;

pub use authentication::*;
pub use constants::*;
pub use database::*;
pub use database::error::Error;
