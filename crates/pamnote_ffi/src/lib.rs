//! Flutter bridge for PamNote core.

pub mod api;
