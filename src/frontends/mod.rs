//! A base for implementing front-ends.
//!
//! Front-ends are glue adapters from other http server crates to the interface exposed by
//! individual methods offered in this crate. The exact usage of the front-end varies from
//! implementation to implementation. Composability and usability are the main concerns for
//! front-ends, full feature support is a secondary concern.
//!
//! ## Guide to implementing a custom front-end
//!
//! All front-end implementations start with the [`WebRequest`] trait. It gives the guard read
//! access to the four parts of a request that credentials can be carried in or that a signature
//! covers. As an example request type, let's pretend that the web interface consists of the
//! following type:
//!
//! ```
//! use oxide_guard::frontends::dev::*;
//!
//! struct ExampleRequest {
//!     /// The http method.
//!     method: String,
//!
//!     /// The absolute url as the client requested it, with query.
//!     url: String,
//!
//!     /// The value of the authorization header if any was set.
//!     authorization_header: Option<String>,
//!
//!     /// The body of the request, only if its content type was `application/x-form-urlencoded`
//!     urlbody: Option<NormalizedParameter>,
//! }
//!
//! impl WebRequest for ExampleRequest {
//!     // Our internal frontends error type is `OAuthError`
//!     type Error = OAuthError;
//!
//!     fn method(&mut self) -> Result<Cow<'_, str>, OAuthError> {
//!         Ok(self.method.as_str().into())
//!     }
//!
//!     fn url(&mut self) -> Result<Cow<'_, str>, OAuthError> {
//!         Ok(self.url.as_str().into())
//!     }
//!
//!     fn urlbody(&mut self) -> Result<Cow<'_, dyn QueryParameter + 'static>, OAuthError> {
//!         // Other bodies are not signed, they simply contribute no parameters.
//!         Ok(match self.urlbody.as_ref() {
//!             Some(body) => Cow::Borrowed(body as &dyn QueryParameter),
//!             None => Cow::Owned(NormalizedParameter::new()),
//!         })
//!     }
//!
//!     fn authheader(&mut self) -> Result<Option<Cow<'_, str>>, OAuthError> {
//!         // Borrow the data if it exists, else we had no header. No error cases.
//!         Ok(self.authorization_header.as_ref().map(|string| string.as_str().into()))
//!     }
//! }
//! ```
//!
//! And we're done, the request can be guarded. In fact, the implementation for `simple` is
//! almost the same as what we just did. All that is missing is an [`Endpoint`] that determines
//! the operation of each request, and your web servers main loop driving a [`GuardFlow`].
//!
//! [`WebRequest`]: ../endpoint/trait.WebRequest.html
//! [`Endpoint`]: ../endpoint/trait.Endpoint.html
//! [`GuardFlow`]: ../endpoint/struct.GuardFlow.html

pub mod simple;

/// Simply a prelude useful for writing front-ends.
pub mod dev {
    pub use std::borrow::Cow;
    pub use crate::endpoint::{Endpoint, GuardFlow, Operation, WebRequest};
    pub use crate::endpoint::{NormalizedParameter, OAuthError, QueryParameter};
    pub use crate::guard::{Outcome, Rejection, RejectionStatus};
}
