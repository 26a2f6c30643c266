pub mod api;
pub mod config;
pub mod error;
pub mod generate;
pub mod observability;
pub mod prompt;
pub mod protocol;
pub mod routing;
pub mod state;
pub mod storage;
pub mod stream;
pub mod transport;

mod util;
