use crate::error::Result;
use rusqlite::{Connection, OpenFlags};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Bounded set of read-only SQLite handles shared by materialization calls.
///
/// A pool backed by a file opens new handles on demand and keeps at most
/// `max_idle` of them around. A pool built from existing connections never
/// opens new ones; callers wait until a handle is returned.
#[derive(Debug)]
pub struct ConnectionPool {
    path: Option<PathBuf>,
    idle: Mutex<Vec<Connection>>,
    returned: Condvar,
    max_idle: usize,
}

impl ConnectionPool {
    /// Pool over a GeoPackage file. One handle is opened eagerly so that a
    /// missing or unreadable file is reported immediately.
    pub fn open<P: AsRef<Path>>(path: P, max_idle: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = open_read_only(&path)?;
        Ok(Self {
            path: Some(path),
            idle: Mutex::new(vec![conn]),
            returned: Condvar::new(),
            max_idle: max_idle.max(1),
        })
    }

    /// Pool over an already opened handle, for example an in-memory database.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            path: None,
            idle: Mutex::new(vec![conn]),
            returned: Condvar::new(),
            max_idle: 1,
        }
    }

    /// Take a handle out of the pool. It goes back when the guard is dropped.
    pub fn acquire(&self) -> Result<PooledConnection<'_>> {
        let mut idle = self.lock_idle();
        loop {
            if let Some(conn) = idle.pop() {
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(conn),
                });
            }

            match &self.path {
                Some(path) => {
                    drop(idle);
                    tracing::debug!(path = %path.display(), "Opening additional gpkg connection");
                    let conn = open_read_only(path)?;
                    return Ok(PooledConnection {
                        pool: self,
                        conn: Some(conn),
                    });
                }
                None => {
                    idle = self
                        .returned
                        .wait(idle)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Number of handles currently waiting in the pool.
    pub fn idle_count(&self) -> usize {
        self.lock_idle().len()
    }

    fn release(&self, conn: Connection) {
        let mut idle = self.lock_idle();
        if self.path.is_none() || idle.len() < self.max_idle {
            idle.push(conn);
        }
        drop(idle);
        self.returned.notify_one();
    }

    fn lock_idle(&self) -> MutexGuard<'_, Vec<Connection>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn open_read_only(path: &Path) -> Result<Connection> {
    Ok(Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?)
}

/// A handle borrowed from a [`ConnectionPool`].
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only taken in `drop`.
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
