pub mod optimizer;
pub mod raster;
pub mod reader;
pub mod writer;
