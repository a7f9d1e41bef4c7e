mod channel;
mod local_file;
mod node;

pub(crate) use self::channel::ChannelRow;
pub use self::channel::Channel;
pub(crate) use self::local_file::LocalFileRow;
pub use self::local_file::LocalFile;
pub(crate) use self::node::ContentNodeRow;
pub use self::node::{ContentKind, ContentNode};
