//! Shared data models for discovery aggregation

mod apiservice;
mod discovery;
mod resource_list;

pub use apiservice::*;
pub use discovery::*;
pub use resource_list::*;
