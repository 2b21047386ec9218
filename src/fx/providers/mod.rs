pub(crate) mod cbr_provider;
pub(crate) mod rate_provider;

pub use cbr_provider::CbrProvider;
pub use rate_provider::RateProvider;
