pub mod error;
pub mod header;
pub mod source;
pub mod record;
pub mod node;
pub mod archive;
pub mod diff;
pub mod util;

pub use error::{Error, FormatError, Result};
pub use header::{Header, HEADER_SIZE, MAGIC};
pub use source::{ReadSeek, SharedSource};
pub use record::{decode_record, Record, RecordHeader, Tag};
pub use node::{ChildRef, Directory, FileNode, Walk, WalkEntry};
pub use archive::{Archive, ExtractStats};
