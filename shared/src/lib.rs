pub mod config;
pub mod fcm_auth;
pub mod models;
pub mod push;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
