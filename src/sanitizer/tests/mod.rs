//! Tests for the sanitization pipeline
//!
//! Exercises each stage and the full run on a synthetic two-input summer day.

pub mod bound_filtering;
pub mod imputation_order;
