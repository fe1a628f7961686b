mod session_tests;
mod test_utils;
