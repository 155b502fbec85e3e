pub mod dump;
pub mod load;
pub mod meta;
pub mod status;
