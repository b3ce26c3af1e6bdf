//! A baseline implemention of [`Endpoint`] and [`WebRequest`].
//!
//! Contains straightforward request and response formats suitable for HTTP-less applications of
//! the guard. This is useful for testing as well as resource servers that operate behind an HTTP
//! portal which already decoded the request.
//!
//! [`Endpoint`]: ../../endpoint/trait.Endpoint.html
//! [`WebRequest`]: ../../endpoint/trait.WebRequest.html
pub mod endpoint;

pub mod request;
