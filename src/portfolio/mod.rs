pub mod dashboard_model;
pub mod dashboard_service;
pub mod plan_fact_model;
pub mod plan_fact_service;
pub mod series_calculator;

pub use dashboard_model::{
    DashboardPoint, DashboardRange, DashboardSeries, PeriodAggregate, ReturnMethod, SeriesPoint,
};
pub use dashboard_service::DashboardService;
pub use plan_fact_model::{
    resolve_projection_window, PlanFactPoint, PlanFactSeries, PlanScenario, ProjectionWindow,
};
pub use plan_fact_service::PlanFactService;
pub use series_calculator::{compute_series, select_window};
