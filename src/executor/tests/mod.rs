//! Resolver tests, grouped by language area

mod helpers;

mod error_tests;
mod literal_tests;
