//! Property test modules

mod credential_tests;
mod shell_tests;
mod transcript_tests;
