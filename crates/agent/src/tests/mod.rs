//! Scenario tests for the agent loop with scripted collaborators.

mod fakes;
