//! End-to-end scenarios (§8) live under `tests/`; this crate has no library surface of
//! its own.
