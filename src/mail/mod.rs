pub mod decoders;
pub mod digest;
pub mod extractor;
