mod model;
mod store;

pub use model::{ApiKeyPlacement, Auth, AuthMethod, Environment, EnvironmentProfile};
pub use store::{EnvironmentStore, StoreError};
