//! SQLite-backed vector index with exact cosine search

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::cmp::Ordering;
use std::path::Path;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::VectorSearchResult;
use crate::types::{ChunkMetadata, IndexRecord};

/// Persistent store of index records
pub struct VectorStore {
    conn: Mutex<Connection>,
    /// Every stored and queried embedding must have this length
    dimensions: usize,
}

impl VectorStore {
    /// Create or open the index at the given path
    pub fn open<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::vector_db(format!("Failed to open {}: {}", path.display(), e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            dimensions,
        };
        store.migrate()?;
        Ok(store)
    }

    /// Create an in-memory index (for testing)
    #[cfg(test)]
    pub fn in_memory(dimensions: usize) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            dimensions,
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS index_records (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                embedding BLOB NOT NULL,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;

        // The first open fixes the dimension for the lifetime of the file
        conn.execute(
            "INSERT OR IGNORE INTO index_meta (key, value) VALUES ('dimensions', ?1)",
            params![self.dimensions.to_string()],
        )?;
        let stored: String = conn.query_row(
            "SELECT value FROM index_meta WHERE key = 'dimensions'",
            [],
            |row| row.get(0),
        )?;
        if stored != self.dimensions.to_string() {
            return Err(Error::vector_db(format!(
                "Index was created for {} dimensions, configured for {}",
                stored, self.dimensions
            )));
        }

        Ok(())
    }

    fn check_dimensions(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(Error::vector_db(format!(
                "Embedding has {} dimensions, index expects {}",
                embedding.len(),
                self.dimensions
            )));
        }
        Ok(())
    }

    /// Insert records in a single transaction
    pub fn insert(&self, records: &[IndexRecord]) -> Result<()> {
        for record in records {
            self.check_dimensions(&record.embedding)?;
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO index_records (id, embedding, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            let now = Utc::now();

            for record in records {
                stmt.execute(params![
                    record.id.to_string(),
                    encode_embedding(&record.embedding),
                    record.content,
                    serde_json::to_string(&record.metadata)?,
                    now,
                ])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    /// Exact k-nearest-neighbour search by cosine similarity.
    /// Equal scores keep insertion order.
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        self.check_dimensions(query_embedding)?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let query_norm = l2_norm(query_embedding);
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id, embedding, content, metadata FROM index_records ORDER BY seq")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (id, blob, content, metadata) = row?;
            let embedding = decode_embedding(&blob)?;
            if embedding.len() != self.dimensions {
                return Err(Error::vector_db(format!(
                    "Stored record {} has {} dimensions, index expects {}",
                    id,
                    embedding.len(),
                    self.dimensions
                )));
            }
            let similarity = cosine_similarity(query_embedding, &embedding, query_norm);

            results.push(VectorSearchResult {
                id: Uuid::parse_str(&id)
                    .map_err(|e| Error::vector_db(format!("Corrupt record id '{}': {}", id, e)))?,
                content,
                metadata: serde_json::from_str::<ChunkMetadata>(&metadata)?,
                similarity,
            });
        }

        // Stable sort keeps insertion order among ties
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }

    /// Number of stored records
    pub fn len(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM index_records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether the index holds no records
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(Error::vector_db(format!(
            "Corrupt embedding blob of {} bytes",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; zero vectors score 0.0
fn cosine_similarity(query: &[f32], other: &[f32], query_norm: f32) -> f32 {
    let other_norm = l2_norm(other);
    if query_norm == 0.0 || other_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = query.iter().zip(other.iter()).map(|(x, y)| x * y).sum();
    dot / (query_norm * other_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(content: &str, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord::new(content.to_string(), embedding, "doc.txt")
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let store = VectorStore::in_memory(3).unwrap();
        assert!(store.is_empty().unwrap());
        assert!(store.search(&[1.0, 0.0, 0.0], 3).unwrap().is_empty());
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let store = VectorStore::in_memory(3).unwrap();
        store
            .insert(&[
                record("x axis", vec![1.0, 0.0, 0.0]),
                record("y axis", vec![0.0, 1.0, 0.0]),
                record("mostly x", vec![0.9, 0.1, 0.0]),
                record("z axis", vec![0.0, 0.0, 1.0]),
            ])
            .unwrap();

        let results = store.search(&[1.0, 0.0, 0.0], 3).unwrap();
        let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();

        assert_eq!(contents[0], "x axis");
        assert_eq!(contents[1], "mostly x");
        assert_eq!(results.len(), 3);
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
        assert_eq!(results[0].metadata.source, "doc.txt");
    }

    #[test]
    fn test_fewer_records_than_k() {
        let store = VectorStore::in_memory(2).unwrap();
        store.insert(&[record("only", vec![1.0, 1.0])]).unwrap();

        let results = store.search(&[0.5, 0.5], 3).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "only");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let store = VectorStore::in_memory(2).unwrap();
        store
            .insert(&[
                record("first", vec![1.0, 0.0]),
                record("second", vec![2.0, 0.0]),
                record("third", vec![3.0, 0.0]),
            ])
            .unwrap();

        let results = store.search(&[1.0, 0.0], 3).unwrap();
        let contents: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dimension_mismatch_rejects_whole_batch() {
        let store = VectorStore::in_memory(2).unwrap();
        let err = store
            .insert(&[record("ok", vec![1.0, 0.0]), record("bad", vec![1.0])])
            .unwrap_err();

        assert!(matches!(err, Error::VectorDb(_)));
        assert_eq!(store.len().unwrap(), 0);
        assert!(store.search(&[1.0, 0.0, 0.0], 1).is_err());
    }

    #[test]
    fn test_duplicate_id_rolls_back_batch() {
        let store = VectorStore::in_memory(1).unwrap();
        let first = record("a", vec![1.0]);
        store.insert(&[first.clone()]).unwrap();

        let err = store.insert(&[record("b", vec![1.0]), first]).unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_records_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.sqlite3");

        let inserted = record("persisted chunk", vec![0.0, 1.0]);
        {
            let store = VectorStore::open(&path, 2).unwrap();
            store.insert(&[inserted.clone()]).unwrap();
        }

        let store = VectorStore::open(&path, 2).unwrap();
        let results = store.search(&[0.0, 1.0], 1).unwrap();
        assert_eq!(results[0].id, inserted.id);
        assert_eq!(results[0].content, "persisted chunk");
    }

    #[test]
    fn test_reopen_with_other_dimensions_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.sqlite3");

        {
            let store = VectorStore::open(&path, 2).unwrap();
            store.insert(&[record("old", vec![1.0, 0.0])]).unwrap();
        }

        let err = VectorStore::open(&path, 3).err().unwrap();
        assert!(matches!(err, Error::VectorDb(ref m) if m.contains("2 dimensions")));

        // The original dimension still opens
        let store = VectorStore::open(&path, 2).unwrap();
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_stored_vector_of_wrong_length_is_an_error() {
        let store = VectorStore::in_memory(2).unwrap();
        store.insert(&[record("good", vec![1.0, 0.0])]).unwrap();
        store
            .conn
            .lock()
            .execute(
                "INSERT INTO index_records (id, embedding, content, metadata, created_at)
                 VALUES (?1, ?2, 'stale', '{\"source\":\"old.txt\"}', ?3)",
                params![Uuid::new_v4().to_string(), encode_embedding(&[1.0]), Utc::now()],
            )
            .unwrap();

        let err = store.search(&[1.0, 0.0], 3).unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));
    }

    #[test]
    fn test_created_at_is_stored() {
        let store = VectorStore::in_memory(1).unwrap();
        store.insert(&[record("a", vec![1.0])]).unwrap();

        let created: chrono::DateTime<Utc> = store
            .conn
            .lock()
            .query_row("SELECT created_at FROM index_records", [], |row| row.get(0))
            .unwrap();
        assert!(created <= Utc::now());
    }

    #[test]
    fn test_embedding_blob_round_trip() {
        let values = vec![0.25f32, -1.5, f32::MIN_POSITIVE, 3.0e7];
        assert_eq!(decode_embedding(&encode_embedding(&values)).unwrap(), values);
        assert!(decode_embedding(&[0u8; 5]).is_err());
    }
}
