pub(crate) mod fx_errors;
pub(crate) mod fx_model;
pub(crate) mod fx_repository;
pub(crate) mod fx_service;
pub(crate) mod fx_sync_service;
pub(crate) mod fx_traits;
pub(crate) mod providers;

// Re-export the public interface
pub use fx_errors::FxError;
pub use fx_model::{CurrencyPair, CurrencyRate, NewCurrencyRate};
pub use fx_repository::FxRepository;
pub use fx_service::{resolve_rate, CurrencyConverter, FxService};
pub use fx_sync_service::{RateSyncConfig, RateSyncService, SyncSummary};
pub use fx_traits::FxRepositoryTrait;
pub use providers::{CbrProvider, RateProvider};
