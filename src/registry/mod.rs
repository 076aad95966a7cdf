//! Discovered endpoint classes and their classification
//!
//! The embedding application registers its endpoint classes here; the server
//! partitions them into serving roles at start time.

pub mod class;
pub mod classifier;
pub mod handler;
pub mod resolver;

pub use class::{EndpointClass, EndpointClassBuilder, EndpointFactory, MarkerKind};
pub use classifier::{Classification, classify};
pub use handler::{Provider, RawHandler, Resource, SocketEndpoint};
pub use resolver::{InstanceResolver, NullResolver};
