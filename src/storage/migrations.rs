use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// Schema steps for the key-value table. Step `n` brings `user_version`
/// from `n` to `n + 1`; the store's version is the number of steps.
const SCHEMA_STEPS: &[&str] = &[include_str!("schemas/schema_v1.sql")];

fn store_version() -> i32 {
    SCHEMA_STEPS.len() as i32
}

/// Brings the kv table up to the current layout. Already current stores are
/// left alone; a file written by a newer build is refused rather than guessed at.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let target = store_version();
    let found: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("could not read the engagement store version")?;

    if found > target {
        bail!("engagement store is at version {found}, this build only knows up to {target}");
    }
    if found == target {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("could not start engagement store upgrade")?;
    for (index, step) in SCHEMA_STEPS.iter().enumerate().skip(found as usize) {
        tx.execute_batch(step)
            .with_context(|| format!("engagement store step {} failed", index + 1))?;
    }
    tx.pragma_update(None, "user_version", target)
        .context("could not record the engagement store version")?;
    tx.commit()
        .context("could not commit engagement store upgrade")
}
