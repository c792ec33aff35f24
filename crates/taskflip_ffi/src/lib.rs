//! Flutter-facing bridge for the Taskflip core.

pub mod api;
