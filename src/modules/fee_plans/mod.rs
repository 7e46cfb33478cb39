// Fee plans module: plan configuration and the resolver that turns it into line items

pub mod models;
pub mod repository;
pub mod services;

pub use models::{FeeAssignment, FeePlan, PlanComponent};
pub use repository::{FeePlanRepository, MySqlFeePlanRepository};
pub use services::{LineItemResolver, Resolution, ResolutionStrategy, ResolveTarget};
