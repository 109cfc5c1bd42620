mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Ingest, Postgres, Providers, Qdrant, Search, Service, Storage,
};

use std::{
	fs,
	path::{Path, PathBuf},
};

pub const BACKEND_POSTGRES: &str = "postgres";
pub const BACKEND_MEMORY: &str = "memory";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	finish(cfg)
}

/// Parses an in-memory TOML document with the same normalization and validation as [`load`].
pub fn from_toml_str(raw: &str) -> Result<Config> {
	let cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: PathBuf::from("<inline>"), source: err })?;

	finish(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.vector_dim == 0 {
		return Err(Error::Validation {
			message: "storage.vector_dim must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.vector_dim.".to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider embedding api_key must be non-empty.".to_string(),
		});
	}

	match cfg.storage.backend.as_str() {
		BACKEND_POSTGRES => {
			let Some(postgres) = cfg.storage.postgres.as_ref() else {
				return Err(Error::Validation {
					message: "storage.postgres is required when storage.backend is postgres."
						.to_string(),
				});
			};

			if postgres.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty.".to_string(),
				});
			}
			if postgres.pool_max_conns == 0 {
				return Err(Error::Validation {
					message: "storage.postgres.pool_max_conns must be greater than zero."
						.to_string(),
				});
			}

			let Some(qdrant) = cfg.storage.qdrant.as_ref() else {
				return Err(Error::Validation {
					message: "storage.qdrant is required when storage.backend is postgres."
						.to_string(),
				});
			};

			for (label, value) in
				[("storage.qdrant.url", &qdrant.url), ("storage.qdrant.collection", &qdrant.collection)]
			{
				if value.trim().is_empty() {
					return Err(Error::Validation { message: format!("{label} must be non-empty.") });
				}
			}
		},
		BACKEND_MEMORY => {},
		_ => {
			return Err(Error::Validation {
				message: "storage.backend must be one of postgres or memory.".to_string(),
			});
		},
	}

	if !cfg.search.lambda_mult.is_finite() {
		return Err(Error::Validation {
			message: "search.lambda_mult must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&cfg.search.lambda_mult) {
		return Err(Error::Validation {
			message: "search.lambda_mult must be in the range 0.0-1.0.".to_string(),
		});
	}

	if let Some(threshold) = cfg.search.score_threshold
		&& !threshold.is_finite()
	{
		return Err(Error::Validation {
			message: "search.score_threshold must be a finite number.".to_string(),
		});
	}

	if cfg.search.fetch_k == 0 {
		return Err(Error::Validation {
			message: "search.fetch_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_concurrency == 0 {
		return Err(Error::Validation {
			message: "search.max_concurrency must be greater than zero.".to_string(),
		});
	}
	if cfg.ingest.concurrent_writes == 0 {
		return Err(Error::Validation {
			message: "ingest.concurrent_writes must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn finish(mut cfg: Config) -> Result<Config> {
	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

fn normalize(cfg: &mut Config) {
	cfg.storage.backend = cfg.storage.backend.trim().to_ascii_lowercase();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
	if cfg.storage.backend == BACKEND_MEMORY {
		cfg.storage.postgres = None;
		cfg.storage.qdrant = None;
	}
}
