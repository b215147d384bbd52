mod log_store_test;
