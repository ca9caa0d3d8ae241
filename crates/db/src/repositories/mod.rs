//! Zero-sized repositories, one per table family.
//!
//! Single-statement methods accept any [`sqlx::PgExecutor`] so they run the
//! same against the pool or inside a transaction.

pub mod area_repo;
pub mod asset_repo;
pub mod change_log_repo;
pub mod custody_ledger_repo;
pub mod decommission_ledger_repo;
pub mod director_repo;
pub mod folio_reservation_repo;

pub use area_repo::AreaRepo;
pub use asset_repo::AssetRepo;
pub use change_log_repo::ChangeLogRepo;
pub use custody_ledger_repo::CustodyLedgerRepo;
pub use decommission_ledger_repo::DecommissionLedgerRepo;
pub use director_repo::DirectorRepo;
pub use folio_reservation_repo::FolioReservationRepo;
