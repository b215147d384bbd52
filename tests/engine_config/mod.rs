mod engine_config_test;
