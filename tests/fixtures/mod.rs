// Shared builders for integration tests

pub mod sample_diagrams;
