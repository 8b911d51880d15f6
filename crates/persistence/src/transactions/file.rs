//! File-spooled transaction.

use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::{Mutation, MutationIter, Transaction};
use crate::error::{TransactionError, TransactionResult};

/// A transaction that spools mutations to a temporary file.
///
/// Each mutation is written as one JSON line as soon as it is persisted.
/// Iteration reopens the file and decodes lines lazily, so memory use does
/// not grow with the batch. The file is removed when the transaction is
/// dropped.
///
/// A failed append is rolled back to the last complete line. If that also
/// fails, the transaction refuses further mutations.
#[derive(Debug)]
pub struct FileTransaction {
    spool: NamedTempFile,
    len: usize,
    /// Bytes of complete lines in the spool.
    written: u64,
    broken: bool,
}

impl FileTransaction {
    /// Creates a transaction spooling into the system temp directory.
    pub fn new() -> TransactionResult<Self> {
        let spool = NamedTempFile::new().map_err(|e| spool_error("create spool file", e))?;
        Ok(Self::with_spool(spool))
    }

    /// Creates a transaction spooling into `dir`.
    pub fn new_in(dir: impl AsRef<Path>) -> TransactionResult<Self> {
        let spool =
            NamedTempFile::new_in(dir).map_err(|e| spool_error("create spool file", e))?;
        Ok(Self::with_spool(spool))
    }

    fn with_spool(spool: NamedTempFile) -> Self {
        tracing::debug!(path = %spool.path().display(), "Created transaction spool");
        Self {
            spool,
            len: 0,
            written: 0,
            broken: false,
        }
    }

    /// Returns the path of the spool file.
    pub fn path(&self) -> &Path {
        self.spool.path()
    }

    /// Drops any partial line past the last complete one.
    fn rollback(&mut self) -> io::Result<()> {
        let file = self.spool.as_file_mut();
        file.set_len(self.written)?;
        file.seek(SeekFrom::Start(self.written))?;
        Ok(())
    }
}

impl Transaction for FileTransaction {
    fn persist(&mut self, mutation: Mutation) -> TransactionResult<()> {
        if self.broken {
            return Err(spool_error(
                "append mutation",
                io::Error::other("spool holds a partial line"),
            ));
        }

        let mut line =
            serde_json::to_vec(&mutation).map_err(|e| TransactionError::Encoding {
                message: e.to_string(),
            })?;
        line.push(b'\n');

        if let Err(e) = self.spool.as_file_mut().write_all(&line) {
            if let Err(rollback) = self.rollback() {
                tracing::warn!(error = %rollback, "Failed to roll back partial spool line");
                self.broken = true;
            }
            return Err(spool_error("append mutation", e));
        }
        self.written += line.len() as u64;
        self.len += 1;
        Ok(())
    }

    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> TransactionResult<MutationIter<'_>> {
        let file = self
            .spool
            .reopen()
            .map_err(|e| spool_error("reopen spool file", e))?;

        let lines = BufReader::new(file)
            .lines()
            .take(self.len)
            .enumerate()
            .map(|(index, line)| {
                let line = line.map_err(|e| spool_error("read spool file", e))?;
                serde_json::from_str::<Mutation>(&line).map_err(|e| TransactionError::Corrupt {
                    line: index + 1,
                    message: e.to_string(),
                })
            });

        Ok(Box::new(lines))
    }
}

fn spool_error(action: &str, source: std::io::Error) -> TransactionError {
    TransactionError::Spool {
        message: format!("failed to {}", action),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EntitySnapshot, EntityState};
    use crate::types::DocumentPayload;
    use serde_json::json;

    fn upsert(uid: &str) -> Mutation {
        let document: DocumentPayload = json!({"title": uid}).as_object().cloned().unwrap();
        Mutation::Upsert(
            EntitySnapshot::new("post", document)
                .with_uid(uid)
                .with_state(EntityState::Persisted),
        )
    }

    #[test]
    fn test_spool_round_trip_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut tx = FileTransaction::new_in(dir.path()).unwrap();

        tx.persist(upsert("a")).unwrap();
        tx.persist(Mutation::delete("post", "b")).unwrap();
        tx.persist(upsert("c")).unwrap();
        assert_eq!(tx.len(), 3);

        let mutations: Vec<Mutation> = tx.iter().unwrap().map(|m| m.unwrap()).collect();
        assert_eq!(
            mutations,
            vec![upsert("a"), Mutation::delete("post", "b"), upsert("c")]
        );

        // A second pass sees the same batch
        assert_eq!(tx.iter().unwrap().count(), 3);
    }

    #[test]
    fn test_spool_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let tx = FileTransaction::new_in(dir.path()).unwrap();
        let path = tx.path().to_path_buf();
        assert!(path.exists());

        drop(tx);
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupt_line_reported() {
        let mut tx = FileTransaction::new().unwrap();
        tx.persist(Mutation::delete("post", "a")).unwrap();
        tx.spool.as_file_mut().write_all(b"{not json}\n").unwrap();
        tx.len += 1;

        let results: Vec<_> = tx.iter().unwrap().collect();
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(TransactionError::Corrupt { line: 2, .. })
        ));
    }

    #[test]
    fn test_partial_line_rolled_back() {
        let mut tx = FileTransaction::new().unwrap();
        tx.persist(upsert("a")).unwrap();

        // What an interrupted append leaves behind
        tx.spool.as_file_mut().write_all(b"{\"kind\":\"ups").unwrap();
        tx.rollback().unwrap();

        tx.persist(upsert("b")).unwrap();
        let mutations: Vec<Mutation> = tx.iter().unwrap().map(|m| m.unwrap()).collect();
        assert_eq!(mutations, vec![upsert("a"), upsert("b")]);
        assert_eq!(
            std::fs::metadata(tx.path()).unwrap().len(),
            tx.written
        );
    }

    #[test]
    fn test_broken_spool_refuses_mutations() {
        let mut tx = FileTransaction::new().unwrap();
        tx.persist(upsert("a")).unwrap();
        tx.broken = true;

        assert!(matches!(
            tx.persist(upsert("b")),
            Err(TransactionError::Spool { .. })
        ));
        assert_eq!(tx.len(), 1);
    }

    #[test]
    fn test_empty_spool() {
        let tx = FileTransaction::new().unwrap();
        assert!(tx.is_empty());
        assert_eq!(tx.iter().unwrap().count(), 0);
    }
}
