//! Business services driving the billing book.

pub mod services;
