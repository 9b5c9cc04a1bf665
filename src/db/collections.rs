use std::collections::BTreeMap;

use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{Booking, Client, PrizeRecord, Rating, UserStats};

pub type StatsMap = BTreeMap<String, UserStats>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Bookings,
    Ratings,
    Prizes,
    Stats,
}

impl Collection {
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Bookings => "bookings",
            Collection::Ratings => "ratings",
            Collection::Prizes => "prizes",
            Collection::Stats => "stats",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("malformed {collection} collection: {source}")]
    Malformed {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {collection} collection: {source}")]
    Encode {
        collection: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} collection changed since it was read")]
    Stale(&'static str),
}

/// A collection as read from the store, tagged with the version it was read at.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub version: i64,
    pub items: T,
}

pub fn load<T>(conn: &Connection, collection: Collection) -> Result<Snapshot<T>, StoreError>
where
    T: DeserializeOwned + Default,
{
    let result = conn.query_row(
        "SELECT body, version FROM collections WHERE name = ?1",
        params![collection.name()],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
    );

    match result {
        Ok((body, version)) => {
            let items = serde_json::from_str(&body).map_err(|source| StoreError::Malformed {
                collection: collection.name(),
                source,
            })?;
            Ok(Snapshot { version, items })
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(Snapshot {
            version: 0,
            items: T::default(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Replaces the whole collection, provided nobody wrote it since `expected_version`.
/// Returns the new version.
pub fn replace<T>(
    conn: &Connection,
    collection: Collection,
    expected_version: i64,
    items: &T,
) -> Result<i64, StoreError>
where
    T: Serialize,
{
    let body = serde_json::to_string(items).map_err(|source| StoreError::Encode {
        collection: collection.name(),
        source,
    })?;

    conn.execute(
        "INSERT OR IGNORE INTO collections (name, body, version) VALUES (?1, '[]', 0)",
        params![collection.name()],
    )?;

    let changed = conn.execute(
        "UPDATE collections SET body = ?1, version = version + 1, updated_at = datetime('now')
         WHERE name = ?2 AND version = ?3",
        params![body, collection.name(), expected_version],
    )?;

    if changed == 0 {
        return Err(StoreError::Stale(collection.name()));
    }
    Ok(expected_version + 1)
}

/// Starts a write transaction that holds the database write lock until it ends,
/// so concurrent writers in other processes wait instead of interleaving.
pub fn begin_immediate(conn: &mut Connection) -> Result<Transaction<'_>, StoreError> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

/// Read-modify-write of a single collection inside one immediate transaction.
/// Nothing is written when `f` fails.
pub fn modify<T, R, E>(
    conn: &mut Connection,
    collection: Collection,
    f: impl FnOnce(&mut T) -> Result<R, E>,
) -> Result<R, E>
where
    T: Serialize + DeserializeOwned + Default,
    E: From<StoreError>,
{
    let tx = begin_immediate(conn)?;
    let mut snapshot: Snapshot<T> = load(&tx, collection)?;
    let out = f(&mut snapshot.items)?;
    replace(&tx, collection, snapshot.version, &snapshot.items)?;
    tx.commit().map_err(StoreError::from)?;
    Ok(out)
}

// ── Typed accessors ──

pub fn bookings(conn: &Connection) -> Result<Snapshot<Vec<Booking>>, StoreError> {
    load(conn, Collection::Bookings)
}

pub fn stats(conn: &Connection) -> Result<Snapshot<StatsMap>, StoreError> {
    load(conn, Collection::Stats)
}

pub fn prizes(conn: &Connection) -> Result<Snapshot<Vec<PrizeRecord>>, StoreError> {
    load(conn, Collection::Prizes)
}

pub fn ratings(conn: &Connection) -> Result<Snapshot<Vec<Rating>>, StoreError> {
    load(conn, Collection::Ratings)
}

pub fn clients(conn: &Connection) -> Result<Snapshot<Vec<Client>>, StoreError> {
    load(conn, Collection::Users)
}

pub fn find_client(conn: &Connection, user_id: &str) -> Result<Option<Client>, StoreError> {
    Ok(clients(conn)?.items.into_iter().find(|c| c.id == user_id))
}

/// Inserts or replaces a client profile by id.
pub fn upsert_client(conn: &mut Connection, client: Client) -> Result<(), StoreError> {
    modify(conn, Collection::Users, |clients: &mut Vec<Client>| {
        match clients.iter_mut().find(|c| c.id == client.id) {
            Some(existing) => {
                existing.name = client.name;
                existing.email = client.email;
                existing.phone = client.phone;
                existing.birth_date = client.birth_date;
            }
            None => clients.push(client),
        }
        Ok::<_, StoreError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    #[test]
    fn test_empty_collections_after_migration() {
        let conn = setup_db();
        let snapshot = bookings(&conn).unwrap();
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.items.is_empty());
        assert!(stats(&conn).unwrap().items.is_empty());
    }

    #[test]
    fn test_replace_bumps_version() {
        let conn = setup_db();
        let values = vec!["a".to_string(), "b".to_string()];
        let version = replace(&conn, Collection::Ratings, 0, &values).unwrap();
        assert_eq!(version, 1);

        let snapshot: Snapshot<Vec<String>> = load(&conn, Collection::Ratings).unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.items, values);
    }

    #[test]
    fn test_replace_with_stale_version_is_rejected() {
        let conn = setup_db();
        replace(&conn, Collection::Prizes, 0, &vec![1, 2]).unwrap();

        let err = replace(&conn, Collection::Prizes, 0, &vec![3]).unwrap_err();
        assert!(matches!(err, StoreError::Stale("prizes")));

        let snapshot: Snapshot<Vec<i32>> = load(&conn, Collection::Prizes).unwrap();
        assert_eq!(snapshot.items, vec![1, 2]);
    }

    #[test]
    fn test_malformed_body_is_reported() {
        let conn = setup_db();
        conn.execute(
            "UPDATE collections SET body = 'not json' WHERE name = 'bookings'",
            [],
        )
        .unwrap();
        let err = bookings(&conn).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { collection: "bookings", .. }));
    }

    #[test]
    fn test_modify_leaves_collection_untouched_on_error() {
        let mut conn = setup_db();
        let result: Result<(), StoreError> =
            modify(&mut conn, Collection::Ratings, |items: &mut Vec<String>| {
                items.push("discarded".to_string());
                Err(StoreError::Stale("ratings"))
            });
        assert!(result.is_err());

        let snapshot: Snapshot<Vec<String>> = load(&conn, Collection::Ratings).unwrap();
        assert_eq!(snapshot.version, 0);
        assert!(snapshot.items.is_empty());
    }
}
