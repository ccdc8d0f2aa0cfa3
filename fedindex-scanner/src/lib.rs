pub mod activitypub;
pub mod crawler;
pub mod error;
pub mod fetch;
pub mod registry;
pub mod result;
pub mod transport;

pub use crawler::{Crawler, DiscoveryCallback, ResultCallback};
pub use error::{FetchError, ScanError};
pub use fetch::{Relation, fetch_relations};
pub use registry::{Entry, FailureKind, Outcome, SeenRegistry};
pub use result::InstanceResult;
pub use transport::{
    ClientHandle, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TOR_PROXY, Route, TransportConfig,
    TransportRouter,
};
