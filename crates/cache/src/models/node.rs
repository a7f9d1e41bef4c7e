use crate::error::{Error, ErrorKind};
use derive_more::Display;
use exn::ResultExt;
use std::str::FromStr;

/// Kind of a content node. Only [`Topic`](Self::Topic) nodes have children;
/// every other kind is a playable resource.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum ContentKind {
    #[display("topic")]
    Topic,
    #[display("video")]
    Video,
    #[display("audio")]
    Audio,
    #[display("exercise")]
    Exercise,
    #[display("document")]
    Document,
    #[display("html5")]
    Html5,
    #[display("slideshow")]
    Slideshow,
    #[display("h5p")]
    H5p,
    #[display("zim")]
    Zim,
    #[display("quiz")]
    Quiz,
}
impl ContentKind {
    pub fn is_topic(&self) -> bool {
        matches!(self, Self::Topic)
    }
}
impl FromStr for ContentKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "topic" => Self::Topic,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "exercise" => Self::Exercise,
            "document" => Self::Document,
            "html5" => Self::Html5,
            "slideshow" => Self::Slideshow,
            "h5p" => Self::H5p,
            "zim" => Self::Zim,
            "quiz" => Self::Quiz,
            _ => exn::bail!(ErrorKind::InvalidData("content kind")),
        })
    }
}

/// A node of a channel's content tree, including its derived annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    pub id: String,
    pub channel_id: String,
    /// `None` for the channel root
    pub parent_id: Option<String>,
    /// Depth in the tree; the root is level 0.
    pub level: u32,
    pub kind: ContentKind,
    /// Shared by nodes that represent the same underlying content.
    pub content_id: String,
    pub lang_id: Option<String>,
    pub available: bool,
    pub coach_content: bool,
    pub num_coach_contents: u32,
}

#[derive(sqlx::FromRow)]
pub(crate) struct ContentNodeRow {
    id: String,
    channel_id: String,
    parent_id: Option<String>,
    level: i64,
    kind: String,
    content_id: String,
    lang_id: Option<String>,
    available: bool,
    coach_content: bool,
    num_coach_contents: i64,
}
impl TryFrom<ContentNodeRow> for ContentNode {
    type Error = Error;
    fn try_from(row: ContentNodeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            channel_id: row.channel_id,
            parent_id: row.parent_id,
            level: u32::try_from(row.level).or_raise(|| ErrorKind::InvalidData("level"))?,
            kind: row.kind.parse()?,
            content_id: row.content_id,
            lang_id: row.lang_id,
            available: row.available,
            coach_content: row.coach_content,
            num_coach_contents: u32::try_from(row.num_coach_contents)
                .or_raise(|| ErrorKind::InvalidData("number of coach contents"))?,
        })
    }
}
