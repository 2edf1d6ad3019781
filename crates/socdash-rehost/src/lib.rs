//! Download a remote image and re-host it in public object storage.
//!
//! [`ImageRehoster::rehost`] validates the URL, fetches the resource under a
//! fixed timeout, checks it is an image within the size ceiling, and only then
//! uploads it under a fresh unique name. Nothing is uploaded for a request
//! that fails validation.

pub mod error;
pub mod fetch;
pub mod rehoster;
pub mod storage;

pub use error::RehostError;
pub use fetch::FetchedImage;
pub use rehoster::{ImageRehoster, RehostConfig, DEFAULT_MAX_BYTES};
pub use storage::{BucketSpec, ObjectStore, StorageClient, StorageError};
