mod round_timer_tests;
