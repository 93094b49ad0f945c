mod api_tests;
mod postgres_tests;
