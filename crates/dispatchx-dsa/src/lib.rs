#![no_std]
extern crate alloc;

pub mod forest;

pub use forest::{Ancestors, ForestBuilder, ForestError, ForestNode, ServiceForest, ServiceId};
