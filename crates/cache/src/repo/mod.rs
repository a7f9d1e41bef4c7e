mod channel;
mod local_file;
mod tree;

pub use self::channel::ChannelRepository;
pub use self::local_file::{CHUNK_SIZE, LocalFileRepository};
pub use self::tree::{LeafProjection, TreeRepository};
