//! Scenario tests that run several subsystems together
