//! Vehicle service

use crate::{
    error::{AppError, AppResult},
    models::vehicle::{CreateVehicle, UpdateVehicle, Vehicle, VehicleDetails, VehicleQuery},
    repository::Repository,
};

#[derive(Clone)]
pub struct VehiclesService {
    repository: Repository,
}

impl VehiclesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &VehicleQuery) -> AppResult<(Vec<VehicleDetails>, i64)> {
        let mut conn = self.repository.acquire().await?;
        self.repository.vehicles_list(&mut conn, query).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<VehicleDetails> {
        let mut conn = self.repository.acquire().await?;
        self.repository.vehicles_get(&mut conn, id).await
    }

    pub async fn create(&self, data: &CreateVehicle) -> AppResult<Vehicle> {
        data.check()?;

        let mut tx = self.repository.begin().await?;
        if self
            .repository
            .vehicles_plate_exists(&mut tx, &data.plate_number, None)
            .await?
        {
            return Err(AppError::Conflict("Plate number already exists".to_string()));
        }
        let vehicle = self.repository.vehicles_create(&mut tx, data).await?;
        tx.commit().await?;

        tracing::info!(vehicle_id = vehicle.id, plate_number = %vehicle.plate_number, "Vehicle created");
        Ok(vehicle)
    }

    pub async fn update(&self, id: i32, mut data: UpdateVehicle) -> AppResult<Vehicle> {
        data.check()?;
        data.vehicle_type = data.vehicle_type.map(|t| t.trim().to_string());

        let mut tx = self.repository.begin().await?;
        self.repository.vehicles_get_for_update(&mut tx, id).await?;
        if let Some(ref plate) = data.plate_number {
            if self.repository.vehicles_plate_exists(&mut tx, plate, Some(id)).await? {
                return Err(AppError::Conflict("Plate number already exists".to_string()));
            }
        }
        let vehicle = self.repository.vehicles_update(&mut tx, id, &data).await?;
        tx.commit().await?;
        Ok(vehicle)
    }

    /// Soft-delete a vehicle that was never rented
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        self.repository.vehicles_get_for_update(&mut tx, id).await?;
        if self.repository.vehicles_has_rentals(&mut tx, id).await? {
            return Err(AppError::Conflict(
                "Vehicle has associated rentals and cannot be deleted".to_string(),
            ));
        }
        self.repository.vehicles_soft_delete(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(vehicle_id = id, "Vehicle deleted");
        Ok(())
    }
}
