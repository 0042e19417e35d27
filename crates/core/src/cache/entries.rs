//! SQLite implementation of [`CacheStore`].
//!
//! Buckets live in `buckets`; entries in `entries` keyed by `(bucket, url)`,
//! cascading on bucket deletion.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::rusqlite::{self, OptionalExtension, Transaction};
use tokio_rusqlite::params;

use super::connection::CacheDb;
use super::store::CacheStore;
use crate::{Error, Response};

fn encode_headers(headers: &[(String, String)]) -> Result<String, Error> {
    serde_json::to_string(headers).map_err(|e| Error::CacheUnavailable(format!("failed to encode headers: {e}")))
}

fn row_to_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<(u16, String, Vec<u8>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode(raw: Option<(u16, String, Vec<u8>)>) -> Result<Option<Response>, Error> {
    raw.map(|(status, headers_json, body)| {
        let headers = serde_json::from_str(&headers_json)
            .map_err(|e| Error::CacheUnavailable(format!("corrupt headers: {e}")))?;
        Ok(Response { status, headers, body: Bytes::from(body) })
    })
    .transpose()
}

fn upsert(tx: &Transaction<'_>, bucket: &str, url: &str, response: &Response, stored_at: &str) -> Result<(), Error> {
    let headers_json = encode_headers(&response.headers)?;
    tx.execute(
        "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
        params![bucket, stored_at],
    )?;
    tx.execute(
        "INSERT INTO entries (bucket, url, status, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(bucket, url) DO UPDATE SET
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![bucket, url, response.status, headers_json, response.body.as_ref(), stored_at],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, bucket: &str) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![bucket, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn has(&self, bucket: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM buckets WHERE name = ?1)", params![bucket], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn bucket_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM buckets ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<bool, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM buckets WHERE name = ?1", params![bucket])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, bucket: &str, url: &str) -> Result<Option<Response>, Error> {
        let bucket = bucket.to_string();
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let raw = conn
                    .query_row(
                        "SELECT status, headers_json, body FROM entries WHERE bucket = ?1 AND url = ?2",
                        params![bucket, url],
                        row_to_response,
                    )
                    .optional()?;
                decode(raw)
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup(&self, url: &str) -> Result<Option<Response>, Error> {
        let url = url.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let raw = conn
                    .query_row(
                        "SELECT e.status, e.headers_json, e.body
                         FROM entries e JOIN buckets b ON b.name = e.bucket
                         WHERE e.url = ?1
                         ORDER BY b.rowid ASC
                         LIMIT 1",
                        params![url],
                        row_to_response,
                    )
                    .optional()?;
                decode(raw)
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, bucket: &str, url: &str, response: &Response) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let url = url.to_string();
        let response = response.clone();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                upsert(&tx, &bucket, &url, &response, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, bucket: &str, entries: Vec<(String, Response)>) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for (url, response) in &entries {
                    upsert(&tx, &bucket, url, response, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn replace_all(&self, bucket: &str, entries: Vec<(String, Response)>) -> Result<(), Error> {
        let bucket = bucket.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO buckets (name, created_at) VALUES (?1, ?2)",
                    params![bucket, now],
                )?;
                tx.execute("DELETE FROM entries WHERE bucket = ?1", params![bucket])?;
                for (url, response) in &entries {
                    upsert(&tx, &bucket, url, response, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE bucket = ?1 ORDER BY url ASC")?;
                let urls = stmt
                    .query_map(params![bucket], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    async fn entry_count(&self, bucket: &str) -> Result<usize, Error> {
        let bucket = bucket.to_string();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE bucket = ?1", params![bucket], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }
}
