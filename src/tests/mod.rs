mod cooldown_tests;
mod events_tests;
mod reconcile_tests;
mod units_tests;
