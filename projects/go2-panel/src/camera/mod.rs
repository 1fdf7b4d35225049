pub mod frames;
pub mod http;
pub mod selector;
pub mod traits;
