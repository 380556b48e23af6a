pub mod bidix;
pub mod entry;
