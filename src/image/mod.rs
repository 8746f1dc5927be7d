pub mod image_rs_processor;
pub mod processor;
