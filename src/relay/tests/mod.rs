mod verbosity_tests;
