//! Test suites for the Armory daemon.

mod behaviour;
mod support;
mod unit;
