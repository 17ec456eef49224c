pub mod options;

pub use options::CompressionOptions;
