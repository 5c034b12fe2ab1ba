pub mod domain;
pub mod import;
pub mod service;

pub use domain::{Bid, BidId, BidStatus, NewBid};
pub use import::{BidCatalogImporter, BidImportError};
pub use service::{BidService, BidServiceError};
