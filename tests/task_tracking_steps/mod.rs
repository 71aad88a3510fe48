//! Step definitions for task tracking BDD scenarios.

mod given;
mod then;
mod when;
