//! Throwaway Postgres databases and Qdrant collections for integration tests.

mod error;

pub use error::{Error, Result};

use std::{collections::BTreeSet, env, str::FromStr, sync::Mutex, thread, time::Duration};

use qdrant_client::Qdrant;
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];
const QDRANT_TIMEOUT: Duration = Duration::from_secs(10);

pub fn env_dsn() -> Option<String> {
	env::var("WEFT_PG_DSN").ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("WEFT_QDRANT_URL").ok()
}

/// A uniquely named database created from `WEFT_PG_DSN`. Dropped on cleanup or drop, together
/// with any Qdrant collections named through [`TestDatabase::collection_name`].
pub struct TestDatabase {
	dsn: String,
	cleanup: Cleanup,
	collections: Mutex<BTreeSet<String>>,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Failed to parse WEFT_PG_DSN: {err}.")))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("weft_test_{}", Uuid::new_v4().simple());

		admin_conn
			.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|err| Error::Message(format!("Failed to create test database: {err}.")))?;

		let dsn = base_options.database(&name).to_url_lossy().to_string();

		Ok(Self {
			dsn,
			cleanup: Cleanup { database: name, admin_options, collections: Vec::new() },
			collections: Mutex::new(BTreeSet::new()),
			cleaned: false,
		})
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub fn name(&self) -> &str {
		&self.cleanup.database
	}

	/// A collection name unique to this database, deleted at cleanup.
	pub fn collection_name(&self, prefix: &str) -> String {
		let collection = format!("{prefix}_{}", self.cleanup.database);

		self.collections.lock().unwrap_or_else(|err| err.into_inner()).insert(collection.clone());

		collection
	}

	pub async fn cleanup(mut self) -> Result<()> {
		let cleanup = self.take_cleanup();

		self.cleaned = true;

		cleanup.run().await
	}

	fn take_cleanup(&self) -> Cleanup {
		let collections = self
			.collections
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.cloned()
			.collect();

		Cleanup { collections, ..self.cleanup.clone() }
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let cleanup = self.take_cleanup();
		let handle = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test cleanup runtime failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(cleanup.run()) {
				eprintln!("Test cleanup failed: {err}.");
			}
		});

		let _ = handle.join();
	}
}

#[derive(Clone)]
struct Cleanup {
	database: String,
	admin_options: PgConnectOptions,
	collections: Vec<String>,
}
impl Cleanup {
	async fn run(self) -> Result<()> {
		let qdrant = drop_collections(&self.collections).await;
		let database = drop_database(&self.database, &self.admin_options).await;

		database?;
		qdrant
	}
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(Error::Message(format!("Failed to connect to an admin database: {last_err:?}.")))
}

async fn drop_database(name: &str, admin_options: &PgConnectOptions) -> Result<()> {
	let mut conn = PgConnection::connect_with(admin_options).await.map_err(|err| {
		Error::Message(format!("Failed to connect to admin database for cleanup: {err}."))
	})?;
	let _ = sqlx::query(
		"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
	)
	.bind(name)
	.fetch_all(&mut conn)
	.await;

	sqlx::query(format!(r#"DROP DATABASE IF EXISTS "{name}""#).as_str())
		.execute(&mut conn)
		.await
		.map_err(|err| Error::Message(format!("Failed to drop test database: {err}.")))?;

	Ok(())
}

async fn drop_collections(collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let Some(url) = env_qdrant_url() else {
		eprintln!("Skipping Qdrant cleanup; set WEFT_QDRANT_URL to delete test collections.");

		return Ok(());
	};
	let client = Qdrant::from_url(&url).build()?;
	let mut backoff = Duration::from_millis(100);

	for collection in collections {
		let mut attempt = 0;

		loop {
			attempt += 1;

			if let Ok(Ok(false)) =
				time::timeout(QDRANT_TIMEOUT, client.collection_exists(collection.as_str())).await
			{
				break;
			}

			match time::timeout(QDRANT_TIMEOUT, client.delete_collection(collection.clone())).await
			{
				Ok(Ok(_)) => break,
				Ok(Err(err)) if attempt >= 4 =>
					return Err(Error::Message(format!(
						"Failed to delete Qdrant collection {collection:?}: {err}."
					))),
				Err(_) if attempt >= 4 =>
					return Err(Error::Message(format!(
						"Timed out deleting Qdrant collection {collection:?}."
					))),
				_ => {
					time::sleep(backoff).await;

					backoff = backoff.saturating_mul(2).min(Duration::from_secs(2));
				},
			}
		}
	}

	Ok(())
}
