//! Thin clients for the two external services the pipeline reads from.
//!
//! Both share [`HttpClient`], which pairs a base URL with a [`Transport`].
//! Requests are synchronous and never retried.

pub mod alternative;
pub mod auth;
mod transport;
pub mod upbit;

pub use transport::{BlockingTransport, HttpClient, HttpRequest, HttpResponse, Method, Transport};
