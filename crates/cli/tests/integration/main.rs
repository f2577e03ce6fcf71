mod check_tests;
mod common;
mod pack_tests;
mod prepare_tests;
