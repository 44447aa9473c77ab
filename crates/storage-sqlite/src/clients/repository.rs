use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use advisordesk_core::cas::CasRecord;
use advisordesk_core::clients::{Client, ClientRepositoryTrait, NewClient};
use advisordesk_core::errors::{Error, Result};

use super::model::ClientDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::clients;

/// Repository for client aggregates.
///
/// Reads go through the pool; every write goes through the writer actor and
/// is guarded by the `version` column.
pub struct ClientRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl ClientRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

fn not_found(client_id: &str) -> Error {
    Error::NotFound(format!("Client {} not found", client_id))
}

#[async_trait]
impl ClientRepositoryTrait for ClientRepository {
    async fn create(&self, new_client: NewClient) -> Result<Client> {
        let now = Utc::now();
        let client = Client {
            id: new_client
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            name: new_client.name,
            email: new_client.email,
            identity_number: new_client.identity_number,
            cas: CasRecord::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let row = ClientDB::try_from(&client)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Client> {
                let inserted = diesel::insert_into(clients::table)
                    .values(&row)
                    .returning(ClientDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(Client::try_from(inserted)?)
            })
            .await
    }

    fn get_by_id(&self, client_id: &str) -> Result<Client> {
        let mut conn = get_connection(&self.pool)?;
        let row = clients::table
            .select(ClientDB::as_select())
            .find(client_id)
            .first::<ClientDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .ok_or_else(|| not_found(client_id))?;
        Ok(Client::try_from(row)?)
    }

    fn list(&self) -> Result<Vec<Client>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = clients::table
            .select(ClientDB::as_select())
            .order((clients::name.asc(), clients::id.asc()))
            .load::<ClientDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter()
            .map(|row| Client::try_from(row).map_err(Error::from))
            .collect()
    }

    async fn save(&self, client: Client) -> Result<Client> {
        let expected_version = client.version;
        let mut row = ClientDB::try_from(&client)?;
        row.version = expected_version + 1;
        row.updated_at = Utc::now().naive_utc();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Client> {
                let affected = diesel::update(
                    clients::table
                        .filter(clients::id.eq(&row.id))
                        .filter(clients::version.eq(expected_version)),
                )
                .set(&row)
                .execute(conn)
                .map_err(StorageError::from)?;

                if affected == 0 {
                    let stored_version = clients::table
                        .select(clients::version)
                        .find(&row.id)
                        .first::<i64>(conn)
                        .optional()
                        .map_err(StorageError::from)?;
                    return Err(match stored_version {
                        Some(stored) => {
                            debug!(
                                "Stale save for client {}: expected version {}, found {}",
                                row.id, expected_version, stored
                            );
                            Error::Conflict(format!(
                                "Client {} was modified concurrently. Reload and try again.",
                                row.id
                            ))
                        }
                        None => not_found(&row.id),
                    });
                }

                Ok(Client::try_from(row)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use advisordesk_core::cas::{CasFile, CasStatus, PortfolioSnapshot};
    use advisordesk_core::errors::ErrorKind;
    use tempfile::{tempdir, TempDir};

    fn setup() -> (TempDir, ClientRepository) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("db").join("app.db");
        let db_path = init(db_path.to_str().unwrap()).unwrap();
        let pool = create_pool(&db_path).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer((*pool).clone());
        (dir, ClientRepository::new(pool, writer))
    }

    fn new_client(id: &str, name: &str) -> NewClient {
        NewClient {
            id: Some(id.to_string()),
            name: name.to_string(),
            email: Some(format!("{}@example.com", id)),
            identity_number: None,
        }
    }

    fn snapshot() -> PortfolioSnapshot {
        serde_json::from_value(serde_json::json!({
            "investor": { "name": "ASHA RAO", "identityNumber": "ABCDE1234F" },
            "mutualFunds": [{
                "folio": "1234567/89",
                "amc": "HDFC Mutual Fund",
                "scheme": "HDFC Flexi Cap Fund - Direct Growth",
                "units": 55.123,
                "nav": 1814.06,
                "value": 100000.0
            }],
            "summary": { "totalValue": 100000.0, "mutualFundValue": 100000.0, "accountCount": 1 },
            "format": "CAMS"
        }))
        .unwrap()
    }

    fn cas_file() -> CasFile {
        CasFile {
            name: "cas.pdf".to_string(),
            storage_path: "c1_1700000000000_cas.pdf".to_string(),
            size: 2048,
            uploaded_at: Utc::now(),
            encrypted_password: None,
        }
    }

    #[tokio::test]
    async fn create_and_read_back() {
        let (_dir, repo) = setup();
        let created = repo.create(new_client("c1", "Asha Rao")).await.unwrap();

        assert_eq!(created.version, 1);
        assert_eq!(created.cas.status(), CasStatus::NotUploaded);

        let loaded = repo.get_by_id("c1").unwrap();
        assert_eq!(loaded.name, "Asha Rao");
        assert_eq!(loaded.email.as_deref(), Some("c1@example.com"));
        assert_eq!(loaded.cas, CasRecord::new());
    }

    #[tokio::test]
    async fn unknown_client_is_not_found() {
        let (_dir, repo) = setup();
        assert_eq!(
            repo.get_by_id("missing").unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn duplicate_id_conflicts() {
        let (_dir, repo) = setup();
        repo.create(new_client("c1", "Asha Rao")).await.unwrap();
        let err = repo.create(new_client("c1", "Other")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn save_persists_cas_record_and_bumps_version() {
        let (_dir, repo) = setup();
        let mut client = repo.create(new_client("c1", "Asha Rao")).await.unwrap();
        client.cas.on_upload(cas_file()).unwrap();
        client.cas.on_parse_requested().unwrap();
        client
            .cas
            .on_parse_succeeded(snapshot(), Utc::now())
            .unwrap();
        client.identity_number = Some("ABCDE1234F".to_string());

        let saved = repo.save(client.clone()).await.unwrap();
        assert_eq!(saved.version, 2);

        let loaded = repo.get_by_id("c1").unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.cas.status(), CasStatus::Parsed);
        assert_eq!(loaded.cas.parsed_data(), Some(&snapshot()));
        assert_eq!(loaded.cas.file().unwrap().storage_path, cas_file().storage_path);
        assert_eq!(loaded.identity_number.as_deref(), Some("ABCDE1234F"));
    }

    #[tokio::test]
    async fn stale_save_conflicts_and_writes_nothing() {
        let (_dir, repo) = setup();
        let client = repo.create(new_client("c1", "Asha Rao")).await.unwrap();

        let mut first = client.clone();
        first.cas.on_upload(cas_file()).unwrap();
        repo.save(first).await.unwrap();

        let mut stale = client;
        stale.name = "Overwritten".to_string();
        let err = repo.save(stale).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let loaded = repo.get_by_id("c1").unwrap();
        assert_eq!(loaded.name, "Asha Rao");
        assert_eq!(loaded.cas.status(), CasStatus::Uploaded);
        assert_eq!(loaded.version, 2);
    }

    #[tokio::test]
    async fn save_of_unknown_client_is_not_found() {
        let (_dir, repo) = setup();
        let mut ghost = repo.create(new_client("c1", "Asha Rao")).await.unwrap();
        ghost.id = "ghost".to_string();
        assert_eq!(
            repo.save(ghost).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn clearing_optional_fields_is_persisted() {
        let (_dir, repo) = setup();
        let mut client = repo.create(new_client("c1", "Asha Rao")).await.unwrap();
        client.email = None;
        repo.save(client).await.unwrap();
        assert!(repo.get_by_id("c1").unwrap().email.is_none());
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let (_dir, repo) = setup();
        repo.create(new_client("c2", "Ravi")).await.unwrap();
        repo.create(new_client("c1", "Asha")).await.unwrap();

        let names: Vec<String> = repo.list().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Asha".to_string(), "Ravi".to_string()]);
    }
}
