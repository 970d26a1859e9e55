//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `speak` - Text-to-speech REST API
//! - `voices` - Voice and model listing endpoint

pub mod api;
pub mod speak;
pub mod voices;
