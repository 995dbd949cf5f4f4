//! Platform adapters: the four county-site shapes plus a manual
//! operator-ingest path, all behind one `PlatformAdapter` trait.

pub mod adapter;
pub mod aspnet_viewstate;
pub mod auction_platform;
pub mod calendar_pdf;
pub mod dedup;
pub mod document;
pub mod error;
pub mod generic_county;
pub mod manual;

pub use adapter::PlatformAdapter;
pub use aspnet_viewstate::AspNetViewstateAdapter;
pub use auction_platform::AuctionPlatformAdapter;
pub use calendar_pdf::CalendarPdfAdapter;
pub use dedup::DownloadIndex;
pub use document::{DocumentRef, DownloadedDocument};
pub use error::{AdapterError, AdapterResult};
pub use generic_county::GenericCountyAdapter;
pub use manual::ManualAdapter;
