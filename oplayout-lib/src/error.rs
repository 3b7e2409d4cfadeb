use thiserror::Error;

/// Reasons a class layout is rejected, or a checked access to an instance fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("relative size requires a base class")]
    MissingBase,
    #[error("{0}")]
    RelativeOffsetMisuse(&'static str),
    #[error("negative item size is not supported")]
    UnsupportedRelativeItemSize,
    #[error("instance size overflows")]
    SizeOverflow,
    #[error("member `{name}` does not fit into the private region")]
    MemberOutOfRange { name: String },
    #[error("special member `{name}` must be a read-only isize")]
    InvalidSpecialMember { name: String },
    #[error("base class already owns item storage")]
    DuplicateItemStorage,
    #[error("base class item storage is not located at the end of the instance")]
    ItemsNotAtEnd,
    #[error("class `{name}` already exists")]
    DuplicateClass { name: String },
    #[error("member `{name}` is read-only")]
    ReadOnlyMember { name: String },
    #[error("value does not match the type of member `{name}`")]
    MemberTypeMismatch { name: String },
    #[error("class is not in the hierarchy of the instance")]
    NotInHierarchy,
    #[error("class does not use relative size")]
    NotRelative,
    #[error("absolute size {size} is smaller than the base size {base_size}")]
    AbsoluteSizeTooSmall { size: usize, base_size: usize },
    #[error("private region ends past the instance")]
    PrivateOutOfBounds,
}

pub type LayoutResult<T> = Result<T, LayoutError>;

pub const RELATIVE_OFFSET_WITHOUT_RELATIVE_SIZE: &str = "relative offset without relative size";
pub const RELATIVE_TAG_REQUIRED: &str = "relative tag required in this context";
pub const RELATIVE_OFFSET_IN_MEMBER_ACCESS: &str = "relative offset in member access";
