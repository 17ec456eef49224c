pub mod compressor;
pub mod page_raster;
pub mod paginate;
