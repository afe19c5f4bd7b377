pub mod address;

pub use address::{validate, Address};
