/// Write-then-read mapping tests across every entity
pub mod mapping_tests;
