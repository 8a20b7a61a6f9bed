//! Resolver tests, grouped by concern.

mod dialects;
mod locking;
