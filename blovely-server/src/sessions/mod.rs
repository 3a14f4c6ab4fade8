pub mod identity;
pub mod registry;

pub use registry::SessionRegistry;
