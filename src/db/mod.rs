pub mod appointmentdb;
pub mod biddb;
pub mod cache;
pub mod catalogdb;
pub mod contractordb;
pub mod db;
pub mod jobdb;
pub mod userdb;

#[cfg(test)]
pub mod memory;

use appointmentdb::AppointmentExt;
use biddb::BidExt;
use catalogdb::CatalogExt;
use contractordb::{ContractorExt, ReviewExt};
use jobdb::JobExt;
use userdb::UserExt;

/// Every persistence operation the marketplace services need.
/// Implemented by `DBClient` and, in tests, by the in-memory store.
pub trait MarketplaceStore:
    UserExt + JobExt + BidExt + AppointmentExt + ContractorExt + ReviewExt + CatalogExt + Send + Sync
{
}

impl<T> MarketplaceStore for T where
    T: UserExt + JobExt + BidExt + AppointmentExt + ContractorExt + ReviewExt + CatalogExt + Send + Sync
{
}
