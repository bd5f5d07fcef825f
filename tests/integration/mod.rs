/// Integration tests that exercise the public API against real database files
mod basic_integration;
