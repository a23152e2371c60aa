mod document_codec;
pub use document_codec::DocumentCodec;
pub use document_codec::DocumentCodecError;

mod file_operations;
pub use file_operations::FileOperations;
pub use file_operations::FileOperationsError;

mod lock_manager;
pub use lock_manager::LockManager;

mod path_resolver;
pub use path_resolver::PathResolver;
