pub mod log;
pub mod meta;
pub mod store;

pub use log::{LogSink, TracingSink};
pub use meta::MetadataStore;
pub use store::{RecordStore, Records};
