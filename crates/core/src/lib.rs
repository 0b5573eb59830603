pub mod config;
pub mod corpus;
pub mod error;
pub mod rule;

pub use config::Config;
pub use corpus::*;
pub use error::*;
pub use rule::*;
