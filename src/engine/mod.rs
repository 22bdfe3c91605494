pub mod eligibility;
pub mod lifecycle;
pub mod materialize;
pub mod optimize;
pub mod selection;
