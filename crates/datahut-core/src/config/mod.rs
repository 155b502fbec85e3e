pub mod store;

pub use store::{HutConfig, SynchronousMode};
