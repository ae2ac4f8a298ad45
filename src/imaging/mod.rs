pub mod annotator;
pub mod codec;
