/// Where to find PostgreSQL.
///
/// This is just the connection URL plus the small amount of parsing the
/// pool helpers need: the database name, and a sibling URL for maintenance
/// statements that cannot run inside the target database. Nothing here
/// opens connections, and the `--database-url` / `VOYA_DATABASE_URL` /
/// config-file resolution chain lives with the binary, not in this crate.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_url: String,
}

impl DbConfig {
    /// Fallback URL when neither the CLI nor the environment supplies one.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/voya";

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// The database name: everything after the URL's last `/`, with any
    /// `?options` suffix stripped. `None` when the URL has no path segment
    /// or the segment is empty.
    pub fn database_name(&self) -> Option<&str> {
        let (_, tail) = self.database_url.rsplit_once('/')?;
        let name = tail.split('?').next().unwrap_or(tail);
        (!name.is_empty()).then_some(name)
    }

    /// The same server, pointed at the stock `postgres` database.
    ///
    /// `CREATE DATABASE` must be issued from some other database, and
    /// `postgres` is the one guaranteed to exist. Connection options after
    /// `?` carry over.
    pub fn maintenance_url(&self) -> String {
        let Some((head, tail)) = self.database_url.rsplit_once('/') else {
            return self.database_url.clone();
        };
        match tail.split_once('?') {
            Some((_, options)) => format!("{head}/postgres?{options}"),
            None => format!("{head}/postgres"),
        }
    }
}
