//! Engine module containing account management and the fund-transfer state machine

pub mod account;
pub mod core;

pub use account::*;
pub use core::*;
