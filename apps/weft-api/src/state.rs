use std::sync::Arc;

use weft_service::{Backend, WeftService};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<WeftService>,
}
impl AppState {
	/// Connects the configured backend. Postgres and Qdrant are bootstrapped on the way.
	pub async fn new(config: weft_config::Config) -> color_eyre::Result<Self> {
		let backend = Backend::connect(&config).await?;
		let service = WeftService::new(config, backend);

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: WeftService) -> Self {
		Self { service: Arc::new(service) }
	}
}
