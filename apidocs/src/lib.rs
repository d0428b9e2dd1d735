pub mod model;
pub mod validation;
pub mod version;
pub mod deprecation;
pub mod store;
pub mod service;
pub mod search;
pub mod render;
pub mod seed;
pub mod error;

pub use error::{ApiDocsError, Result};
pub use model::{ChangeType, EndpointRecord, EndpointVersion, HttpMethod};
pub use service::DocumentationService;
pub use store::EndpointStore;
pub use version::SemVer;
