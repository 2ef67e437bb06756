mod tables_test;
