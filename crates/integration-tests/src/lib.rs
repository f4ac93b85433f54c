//! End-to-end scenarios over the services wired to the in-memory adapters.
//! The tests live under `tests/`; this crate exports nothing.
