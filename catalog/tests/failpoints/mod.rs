mod merge_test;
