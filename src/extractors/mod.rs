//! Property sources
//!
//! Each module turns one data origin into a flat `PropertyMap` (or, for
//! paths, a page name).

mod jsonld;
mod meta;
mod path;
mod query;

pub use jsonld::*;
pub use meta::*;
pub use path::*;
pub use query::*;
