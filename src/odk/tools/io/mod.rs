pub mod archive;
pub mod central;
pub mod csv_read;
pub mod excel_read;
pub mod excel_write;
pub mod export;
pub mod media;
