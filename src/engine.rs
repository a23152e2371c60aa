pub mod io;

mod options;
pub use options::LogLogger;
pub use options::Logger;
pub use options::Options;

mod store;
pub use store::Store;
pub use store::StoreError;
pub use store::StoreErrorKind;
