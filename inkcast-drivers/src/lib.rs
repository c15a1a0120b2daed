//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in inkcast-core:
//!
//! - Radio transceivers (A7106)

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod radio;
