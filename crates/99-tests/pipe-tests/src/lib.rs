//! End-to-end tests for the bounded pipe and its scenario workloads.

#[cfg(test)]
mod native_e2e;

#[cfg(test)]
mod stream_adapter;
