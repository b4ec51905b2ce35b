mod health;
mod root;
mod sample;

pub use health::health_check;
pub use root::hello;
pub use sample::{echo, fail, ping, timeout};
