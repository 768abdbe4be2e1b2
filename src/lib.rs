//! Vitrine: a storefront page accelerator.
//!
//! An on-disk HTML cache that is safe to put in front of a personalized
//! storefront, plus a background scheduler that keeps it warm.

pub mod application;
pub mod cache;
pub mod config;
pub mod infra;
pub mod prewarm;
