use crate::prelude::*;
use cardvault_core::record::CollectionRecord;
use std::future::Future;

pub mod local;
pub mod supabase;

pub use local::LocalStore;
pub use supabase::{SupabaseConfig, SupabaseStore};

/// Durable storage for a user's collection
///
/// `save` is a full overwrite; the last completed write wins.
pub trait CollectionStore: Send + Sync {
    fn save(
        &self,
        user_id: &str,
        records: &[CollectionRecord],
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Returns `None` when nothing has been stored for the user yet.
    fn load(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Option<Vec<CollectionRecord>>, Error>> + Send;
}

/// Store backend selected from configuration
#[derive(Debug)]
pub enum Store {
    Local(LocalStore),
    Supabase(SupabaseStore),
}

impl Store {
    /// Supabase when SUPABASE_URL and SUPABASE_ANON_KEY are set, a local JSON
    /// store otherwise
    pub fn from_global(global: &crate::Global) -> Result<Self> {
        if let Some(config) = SupabaseConfig::from_env() {
            return Ok(Store::Supabase(SupabaseStore::new(&config)?));
        }

        let dir = match &global.data_dir {
            Some(dir) => dir.clone(),
            None => LocalStore::default_dir()?,
        };

        Ok(Store::Local(LocalStore::new(dir)))
    }

    pub fn describe(&self) -> String {
        match self {
            Store::Local(store) => format!("local ({})", store.dir().display()),
            Store::Supabase(store) => format!("supabase ({})", store.base_url()),
        }
    }
}

impl CollectionStore for Store {
    async fn save(&self, user_id: &str, records: &[CollectionRecord]) -> Result<(), Error> {
        match self {
            Store::Local(store) => store.save(user_id, records).await,
            Store::Supabase(store) => store.save(user_id, records).await,
        }
    }

    async fn load(&self, user_id: &str) -> Result<Option<Vec<CollectionRecord>>, Error> {
        match self {
            Store::Local(store) => store.load(user_id).await,
            Store::Supabase(store) => store.load(user_id).await,
        }
    }
}
