/// Unit tests for the domain types and the streak engine through the public API
mod basic_tests;
