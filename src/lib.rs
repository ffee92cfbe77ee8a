#![doc = include_str!("RUSTDOC.md")]

pub mod database;
pub mod error;
pub mod flow;
pub mod settings;

#[cfg(test)]
pub mod test_support;
