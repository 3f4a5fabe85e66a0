// Library exports for integration tests and reusable components

pub mod import;
