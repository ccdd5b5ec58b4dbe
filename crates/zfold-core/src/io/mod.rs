pub mod image_io;
pub mod roi;
pub mod ser;
pub mod ser_writer;
