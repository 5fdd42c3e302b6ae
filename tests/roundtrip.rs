// SPDX-License-Identifier: SEE LICENSE IN LICENSE.md
// SPDX-FileCopyrightText: 2022 CYBERTEC PostgreSQL International GmbH
// <office@cybertec.at>

//! Fixture-driven round-trip coverage: every `tests/fixtures/*.sql` file is
//! parsed, marshaled back to text, and reparsed -- the two trees must be
//! structurally equal (Testable Property 1). This does not assert the
//! marshaled text is byte-identical to the fixture; only that no
//! information is lost or corrupted between the two passes.

use std::fs;
use std::path::Path;

fn test_round_trip(path: &Path) -> datatest_stable::Result<()> {
    let input = fs::read_to_string(path)?;
    let stmt = oraql::unmarshal(&input)?;
    let sql = oraql::marshal(&stmt)?;
    let reparsed = oraql::unmarshal(&sql)?;
    if stmt != reparsed {
        return Err(format!(
            "round trip mismatch for {}\nmarshaled: {sql}\noriginal:  {stmt:#?}\nreparsed:  {reparsed:#?}",
            path.display()
        )
        .into());
    }
    Ok(())
}

datatest_stable::harness!(test_round_trip, "tests/fixtures", r"^.*\.sql$");
