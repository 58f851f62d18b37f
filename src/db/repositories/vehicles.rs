use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_code, parse_column, parse_datetime, parse_optional_datetime},
    models::{VehicleMove, VehicleRecord},
};
use crate::reconcile::{
    LocationUpdate, NewVehicleRecord, RecordStore, StorageTable, StoreError, StoredVehicle,
};
use crate::vin::IdentificationCode;

const VEHICLE_COLUMNS: &str = "id, vin, manufacturer, category, model_year, price, battery_level,
     customs_status, status, storage_table, location, floor, is_showroom,
     showroom_entered_at, created_at, updated_at";

fn row_to_vehicle(row: &Row) -> Result<VehicleRecord> {
    let vin: String = row.get("vin")?;
    let category: String = row.get("category")?;
    let customs_status: String = row.get("customs_status")?;
    let status: String = row.get("status")?;
    let storage_table: String = row.get("storage_table")?;
    let showroom_entered_at: Option<String> = row.get("showroom_entered_at")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;

    Ok(VehicleRecord {
        id: row.get("id")?,
        vin: parse_code(&vin)?,
        manufacturer: row.get("manufacturer")?,
        category: parse_column(&category, "category")?,
        model_year: row.get("model_year")?,
        price: row.get("price")?,
        battery_level: row.get("battery_level")?,
        customs_status: parse_column(&customs_status, "customs_status")?,
        status: parse_column(&status, "status")?,
        storage_table: parse_column(&storage_table, "storage_table")?,
        location: row.get("location")?,
        floor: row.get("floor")?,
        is_showroom: row.get("is_showroom")?,
        showroom_entered_at: parse_optional_datetime(showroom_entered_at, "showroom_entered_at")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

fn row_to_move(row: &Row) -> Result<VehicleMove> {
    let from_storage_table: String = row.get("from_storage_table")?;
    let to_storage_table: String = row.get("to_storage_table")?;
    let moved_at: String = row.get("moved_at")?;

    Ok(VehicleMove {
        id: row.get("id")?,
        vehicle_id: row.get("vehicle_id")?,
        from_storage_table: parse_column(&from_storage_table, "from_storage_table")?,
        from_location: row.get("from_location")?,
        from_floor: row.get("from_floor")?,
        to_storage_table: parse_column(&to_storage_table, "to_storage_table")?,
        to_location: row.get("to_location")?,
        to_floor: row.get("to_floor")?,
        moved_at: parse_datetime(&moved_at, "moved_at")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub struct VehicleRepository<'a> {
    conn: &'a Connection,
}

impl<'a> VehicleRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new vehicle and return its id. A second record with the same
    /// vin fails with [`StoreError::DuplicateCode`].
    pub fn insert(&self, record: &NewVehicleRecord) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let inserted = self.conn.execute(
            "INSERT INTO vehicles (id, vin, manufacturer, category, model_year, price, battery_level,
                                   customs_status, status, storage_table, location, floor, is_showroom,
                                   showroom_entered_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)",
            params![
                id,
                record.vin.as_str(),
                record.manufacturer,
                record.category.as_str(),
                record.model_year,
                record.price,
                record.battery_level,
                record.customs_status.as_str(),
                record.status.as_str(),
                record.storage_table.as_str(),
                record.location,
                record.floor,
                record.is_showroom,
                record.showroom_entered_at.map(|dt| dt.to_rfc3339()),
                now,
            ],
        );

        match inserted {
            Ok(_) => Ok(id),
            Err(err) if is_unique_violation(&err) => {
                Err(StoreError::DuplicateCode(record.vin.to_string()).into())
            }
            Err(err) => Err(anyhow::Error::new(err).context("failed to insert vehicle")),
        }
    }

    pub fn get(&self, id: &str) -> Result<Option<VehicleRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = ?1"))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_vehicle(row)?)),
            None => Ok(None),
        }
    }

    pub fn get_by_vin(&self, vin: &str) -> Result<Option<VehicleRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE vin = ?1"))?;
        let mut rows = stmt.query(params![vin])?;
        match rows.next()? {
            Some(row) => Ok(Some(row_to_vehicle(row)?)),
            None => Ok(None),
        }
    }

    /// Location-only view used by the resolver.
    pub fn find_location_by_vin(&self, vin: &str) -> Result<Option<StoredVehicle>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, vin, storage_table, location, floor FROM vehicles WHERE vin = ?1",
                params![vin],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;

        found
            .map(|(id, vin, storage_table, location, floor)| -> Result<StoredVehicle> {
                Ok(StoredVehicle {
                    id,
                    vin: parse_code(&vin)?,
                    storage_table: parse_column(&storage_table, "storage_table")?,
                    location,
                    floor,
                })
            })
            .transpose()
    }

    pub fn list(&self, storage_table: Option<StorageTable>) -> Result<Vec<VehicleRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles
             WHERE ?1 IS NULL OR storage_table = ?1
             ORDER BY created_at DESC, vin"
        ))?;
        let mut rows = stmt.query(params![storage_table.map(|table| table.as_str())])?;

        let mut vehicles = Vec::new();
        while let Some(row) = rows.next()? {
            vehicles.push(row_to_vehicle(row)?);
        }
        Ok(vehicles)
    }

    /// Overwrite the location fields of `id` and log the move. Call inside a
    /// transaction so the two writes land together.
    pub fn relocate(&self, id: &str, update: &LocationUpdate) -> Result<()> {
        let previous = self
            .conn
            .query_row(
                "SELECT storage_table, location, floor FROM vehicles WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((from_storage_table, from_location, from_floor)) = previous else {
            return Err(StoreError::MissingRecord(id.to_string()).into());
        };

        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE vehicles
                 SET storage_table = ?1,
                     location = ?2,
                     floor = ?3,
                     is_showroom = ?4,
                     showroom_entered_at = ?5,
                     updated_at = ?6
                 WHERE id = ?7",
                params![
                    update.storage_table.as_str(),
                    update.location,
                    update.floor,
                    update.is_showroom,
                    update.showroom_entered_at.map(|dt| dt.to_rfc3339()),
                    now,
                    id,
                ],
            )
            .context("failed to update vehicle location")?;

        self.conn
            .execute(
                "INSERT INTO vehicle_moves (id, vehicle_id, from_storage_table, from_location, from_floor,
                                            to_storage_table, to_location, to_floor, moved_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    id,
                    from_storage_table,
                    from_location,
                    from_floor,
                    update.storage_table.as_str(),
                    update.location,
                    update.floor,
                    now,
                ],
            )
            .context("failed to record vehicle move")?;

        Ok(())
    }

    pub fn moves_for(&self, vehicle_id: &str) -> Result<Vec<VehicleMove>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, vehicle_id, from_storage_table, from_location, from_floor,
                    to_storage_table, to_location, to_floor, moved_at
             FROM vehicle_moves
             WHERE vehicle_id = ?1
             ORDER BY moved_at ASC",
        )?;
        let mut rows = stmt.query(params![vehicle_id])?;

        let mut moves = Vec::new();
        while let Some(row) = rows.next()? {
            moves.push(row_to_move(row)?);
        }
        Ok(moves)
    }
}

// Database async wrappers for vehicle operations
impl Database {
    pub async fn insert_vehicle(&self, record: &NewVehicleRecord) -> Result<String> {
        let record = record.clone();
        self.execute(move |conn| VehicleRepository::new(conn).insert(&record))
            .await
    }

    pub async fn get_vehicle(&self, id: &str) -> Result<Option<VehicleRecord>> {
        let id = id.to_string();
        self.execute(move |conn| VehicleRepository::new(conn).get(&id))
            .await
    }

    pub async fn get_vehicle_by_vin(&self, code: &IdentificationCode) -> Result<Option<VehicleRecord>> {
        let vin = code.to_string();
        self.execute(move |conn| VehicleRepository::new(conn).get_by_vin(&vin))
            .await
    }

    pub async fn list_vehicles(&self, storage_table: Option<StorageTable>) -> Result<Vec<VehicleRecord>> {
        self.execute(move |conn| VehicleRepository::new(conn).list(storage_table))
            .await
    }

    pub async fn relocate_vehicle(&self, id: &str, update: &LocationUpdate) -> Result<()> {
        let id = id.to_string();
        let update = update.clone();
        self.execute(move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open relocation transaction")?;
            VehicleRepository::new(&tx).relocate(&id, &update)?;
            tx.commit().context("failed to commit relocation")?;
            Ok(())
        })
        .await
    }

    pub async fn get_moves_for_vehicle(&self, vehicle_id: &str) -> Result<Vec<VehicleMove>> {
        let vehicle_id = vehicle_id.to_string();
        self.execute(move |conn| VehicleRepository::new(conn).moves_for(&vehicle_id))
            .await
    }
}

#[async_trait]
impl RecordStore for Database {
    async fn find_by_code(&self, code: &IdentificationCode) -> Result<Option<StoredVehicle>, StoreError> {
        let vin = code.to_string();
        self.execute(move |conn| VehicleRepository::new(conn).find_location_by_vin(&vin))
            .await
            .map_err(StoreError::from)
    }

    async fn insert(&self, record: &NewVehicleRecord) -> Result<String, StoreError> {
        self.insert_vehicle(record).await.map_err(StoreError::from)
    }

    async fn update_location_fields(&self, id: &str, update: &LocationUpdate) -> Result<(), StoreError> {
        self.relocate_vehicle(id, update)
            .await
            .map_err(StoreError::from)
    }
}
