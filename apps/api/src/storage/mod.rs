pub mod blobs;
pub mod cache;
