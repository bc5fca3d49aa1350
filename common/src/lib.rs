//! Shared data model and error taxonomy for the O2IMS inventory/alarm core.
//!
//! Mirrors the teacher's `common_lib` crate: one place for the wire/storage
//! types every component (`o2ims-transport`, `o2ims-repository`,
//! `o2ims-collector`, `o2ims-alarm-dictionary`, `o2ims-alarm-events`,
//! `o2ims-notifier`) agrees on, plus the `snafu`-derived error enum each
//! component's errors convert into at the `o2ims-agent` boundary.

pub mod error;
pub mod model;
pub mod storable;

pub use error::{CoreError, CoreResult};
pub use storable::Storable;
