//! Shared test harness modules for the geoharvest CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;
use camino::{Utf8Path, Utf8PathBuf};

mod geocode_unit;
mod helpers;
mod layer_unit;
