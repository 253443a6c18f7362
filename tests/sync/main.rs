// Test module entry point for sync tests
// Integration tests run passes against real temporary trees

mod common;

mod dry_run_tests;
mod name_tests;
mod property_tests;
