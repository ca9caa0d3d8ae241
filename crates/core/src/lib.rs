//! Domain core for asset custody tracking: catalog, ranked search, custody
//! grouping rules, folio numbering, director resolution and the custody
//! lifecycle workflow. Persistence sits behind [`store::CustodyStore`].

pub mod assignment;
pub mod catalog;
pub mod custody;
pub mod director;
pub mod error;
pub mod folio;
pub mod memory;
pub mod notice;
pub mod search;
pub mod store;
pub mod types;
pub mod workflow;
