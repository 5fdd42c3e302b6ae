// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Component E: the three `Statement`-walking transforms -- parameter
//! enumeration, structural parameter deletion, and `IN`/`EXIST` parameter
//! expansion. Every transform is a pure function: it takes its input by
//! value or by shared reference and returns a fresh tree, never mutating
//! the one it was given.

mod delete;
mod expand;
mod params;

pub use params::{find_params_by_string, remove_duplicate_params};
