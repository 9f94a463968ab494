// Feed API surface — item model, remote collaborators, auth, HTTP client.
//
// The pipeline only sees the FeedSource and Amplifier traits. ApiClient is
// the reqwest-backed implementation wired up by the binary; tests plug in
// scripted fakes instead.

pub mod auth;
pub mod client;
pub mod error;
pub mod item;
pub mod rate_limit;
pub mod traits;

pub use error::{ActionError, FetchError};
pub use item::{FeedItem, MediaKind};
pub use auth::{Credentials, OAuth1Credentials};
pub use traits::{Amplifier, FeedSource, MAX_PAGE_SIZE};
