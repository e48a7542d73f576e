pub mod cancel;
pub mod errors;
