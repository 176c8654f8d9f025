//! Shared test harness modules for the birthstats server.

use super::*;

mod config_unit;
mod helpers;
