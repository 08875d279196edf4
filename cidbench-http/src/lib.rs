#![forbid(unsafe_code)]

mod client;
mod error;
mod multipart;
mod types;
mod util;

pub use client::HttpClient;
pub use error::{Error, Result};
pub use multipart::Multipart;
pub use types::{HttpRequest, HttpResponse};
