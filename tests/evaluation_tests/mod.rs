mod builtin_test;
