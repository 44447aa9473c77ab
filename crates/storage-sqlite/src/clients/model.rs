//! Database model for clients.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use advisordesk_core::cas::CasRecord;
use advisordesk_core::clients::Client;

use crate::errors::StorageError;

/// Database row for a client. The CAS record is stored as a JSON document so
/// the whole aggregate is written in one statement.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::clients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct ClientDB {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub identity_number: Option<String>,
    pub cas_record: String,
    pub version: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<ClientDB> for Client {
    type Error = StorageError;

    fn try_from(db: ClientDB) -> Result<Self, Self::Error> {
        let cas: CasRecord = serde_json::from_str(&db.cas_record)?;
        Ok(Self {
            id: db.id,
            name: db.name,
            email: db.email,
            identity_number: db.identity_number,
            cas,
            version: db.version,
            created_at: db.created_at.and_utc(),
            updated_at: db.updated_at.and_utc(),
        })
    }
}

impl TryFrom<&Client> for ClientDB {
    type Error = StorageError;

    fn try_from(domain: &Client) -> Result<Self, Self::Error> {
        Ok(Self {
            id: domain.id.clone(),
            name: domain.name.clone(),
            email: domain.email.clone(),
            identity_number: domain.identity_number.clone(),
            cas_record: serde_json::to_string(&domain.cas)?,
            version: domain.version,
            created_at: domain.created_at.naive_utc(),
            updated_at: domain.updated_at.naive_utc(),
        })
    }
}
