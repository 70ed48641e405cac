pub mod finalizer;
pub mod paths;
pub mod spool_writer;
