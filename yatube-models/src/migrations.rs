use crate::{Connection, Result};

#[cfg(feature = "postgres")]
embed_migrations!("../migrations/postgres");

#[cfg(feature = "sqlite")]
embed_migrations!("../migrations/sqlite");

/// Applies every embedded migration that has not been run yet on this database.
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    let mut output = Vec::new();
    embedded_migrations::run_with_output(conn, &mut output)?;
    for line in String::from_utf8_lossy(&output).lines() {
        info!("{}", line);
    }
    Ok(())
}
