pub mod archiver;
pub mod batch;
pub mod extractor;
pub mod fetcher;
pub mod retry;
