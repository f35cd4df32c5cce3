//! Page analytics enrichment
//!
//! Derives a page name and a flat property map for the current view of a
//! single-page application and forwards them to an analytics sink:
//! - URL query strings
//! - document `<meta>` tags
//! - JSON-LD structured data (flattened into type-prefixed keys)
//!
//! Which sources apply is decided per path by a capture configuration. The
//! `NavigationCoordinator` runs resolution once per navigation; `ffi`
//! exposes one-shot resolution over an HTML snapshot to C/C++ hosts.

pub mod capture;
pub mod coordinator;
pub mod dom;
pub mod element_data;
pub mod engine;
pub mod error;
pub mod extractors;
pub mod ffi;
pub mod properties;

pub use capture::*;
pub use coordinator::*;
pub use dom::*;
pub use engine::*;
pub use error::{Error, Result};
pub use extractors::*;
pub use properties::*;
