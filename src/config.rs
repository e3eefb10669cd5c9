// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{
        BookingRepository, ManagerRepository, PaymentRepository, SlotRepository, SpaceRepository,
        UserRepository,
    },
    services::{
        AuthService, AvailabilityService, BookingService, ManagerService, ProfileService,
        SearchService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,

    pub auth_service: AuthService,
    pub profile_service: ProfileService,
    pub booking_service: BookingService,
    pub availability_service: AvailabilityService,
    pub search_service: SearchService,
    pub manager_service: ManagerService,

    // Handlers that do not warrant a service of their own talk to the
    // repositories directly.
    pub space_repo: SpaceRepository,
    pub slot_repo: SlotRepository,
    pub booking_repo: BookingRepository,
    pub payment_repo: PaymentRepository,
    pub manager_repo: ManagerRepository,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?;

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("database connection established");

        let user_repo = UserRepository::new(db_pool.clone());
        let space_repo = SpaceRepository::new(db_pool.clone());
        let slot_repo = SlotRepository::new(db_pool.clone());
        let booking_repo = BookingRepository::new(db_pool.clone());
        let payment_repo = PaymentRepository::new(db_pool.clone());
        let manager_repo = ManagerRepository::new(db_pool.clone());

        let auth_service = AuthService::new(user_repo.clone(), jwt_secret, db_pool.clone());
        let profile_service = ProfileService::new(user_repo.clone(), db_pool.clone());
        let booking_service = BookingService::new(
            booking_repo.clone(),
            slot_repo.clone(),
            space_repo.clone(),
            payment_repo.clone(),
            user_repo,
            manager_repo.clone(),
            db_pool.clone(),
        );
        let availability_service = AvailabilityService::new(slot_repo.clone());
        let search_service = SearchService::new(space_repo.clone(), slot_repo.clone());
        let manager_service = ManagerService::new(manager_repo.clone(), space_repo.clone());

        Ok(Self {
            db_pool,
            auth_service,
            profile_service,
            booking_service,
            availability_service,
            search_service,
            manager_service,
            space_repo,
            slot_repo,
            booking_repo,
            payment_repo,
            manager_repo,
        })
    }
}
