mod prize_tests;
mod user_tests;
