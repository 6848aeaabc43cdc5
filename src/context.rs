/// Application context and dependency injection
use crate::{
    account::AdminManager,
    admin::{CouponManager, FinanceManager, InventoryManager, PricingManager, SettingsManager},
    config::ServerConfig,
    db,
    error::PortalResult,
    mailer::Mailer,
    registration::RegistrationManager,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: PgPool,
    pub admin_manager: Arc<AdminManager>,
    pub registration_manager: Arc<RegistrationManager>,
    // Super admin areas
    pub coupon_manager: Arc<CouponManager>,
    pub pricing_manager: Arc<PricingManager>,
    pub settings_manager: Arc<SettingsManager>,
    // Inventory & finance
    pub inventory_manager: Arc<InventoryManager>,
    pub finance_manager: Arc<FinanceManager>,
    // Email mailer
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> PortalResult<Self> {
        config.validate()?;

        let pool = db::create_pool(&config.database).await?;

        if config.database.run_migrations {
            db::run_migrations(&pool).await?;
        }

        db::test_connection(&pool).await?;

        Ok(Self::from_pool(config, pool))
    }

    /// Wire every manager around an existing pool
    pub fn from_pool(config: ServerConfig, pool: PgPool) -> Self {
        let config = Arc::new(config);

        let settings_manager = SettingsManager::new(pool.clone());
        let coupon_manager = CouponManager::new(pool.clone());
        let mailer = Mailer::new(settings_manager.clone());

        let registration_manager =
            RegistrationManager::new(pool.clone(), coupon_manager.clone(), mailer.clone());
        let admin_manager = AdminManager::new(pool.clone(), config.clone());

        Self {
            config,
            admin_manager: Arc::new(admin_manager),
            registration_manager: Arc::new(registration_manager),
            coupon_manager: Arc::new(coupon_manager),
            pricing_manager: Arc::new(PricingManager::new(pool.clone())),
            settings_manager: Arc::new(settings_manager),
            inventory_manager: Arc::new(InventoryManager::new(pool.clone())),
            finance_manager: Arc::new(FinanceManager::new(pool.clone())),
            mailer: Arc::new(mailer),
            db: pool,
        }
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
