pub mod filesystem;
pub mod filter;
pub mod headless;
pub mod palette;
pub mod runtime;
pub mod sessions;
