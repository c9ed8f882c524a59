use crate::domain::draft::PostDraft;
use crate::domain::platform::Platform;
use crate::domain::post::char_count;

/// Locally detected composition failures. These block submit and are never
/// sent to the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyContent,
    NoPlatformSelected,
    MissingSchedule,
    OverCharLimit { limit: u32, length: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "content cannot be empty"),
            Self::NoPlatformSelected => write!(f, "select at least one platform"),
            Self::MissingSchedule => write!(f, "scheduled date and time are required"),
            Self::OverCharLimit { limit, length } => write!(
                f,
                "content is {} characters, over the {}-character limit",
                length, limit
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// The binding constraint across a platform selection is the most
/// restrictive target. Undefined (conceptually no limit) when the selection
/// is empty.
pub fn effective_char_limit(platforms: &[Platform]) -> Option<u32> {
    platforms.iter().map(|p| p.char_limit()).min()
}

/// A platform carrying the binding limit. On ties the first selected such
/// platform is reported; the numeric limit itself is unambiguous.
pub fn binding_platform(platforms: &[Platform]) -> Option<Platform> {
    let limit = effective_char_limit(platforms)?;
    platforms.iter().copied().find(|p| p.char_limit() == limit)
}

/// Characters left under the binding limit; negative when over. None when
/// no platforms are chosen.
pub fn remaining(content: &str, platforms: &[Platform]) -> Option<i64> {
    let limit = effective_char_limit(platforms)?;
    Some(i64::from(limit) - char_count(content) as i64)
}

pub fn validate(draft: &PostDraft) -> Result<(), ValidationError> {
    if draft.content().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if draft.platforms().is_empty() {
        return Err(ValidationError::NoPlatformSelected);
    }
    if !draft.has_schedule() {
        return Err(ValidationError::MissingSchedule);
    }
    check_char_limit(draft.content(), draft.platforms())
}

/// Limit check shared by create and partial update, where the effective
/// content/platform pair may mix stored and incoming fields.
pub fn check_char_limit(content: &str, platforms: &[Platform]) -> Result<(), ValidationError> {
    match remaining(content, platforms) {
        Some(left) if left < 0 => {
            // effective_char_limit is Some whenever remaining is.
            let limit = effective_char_limit(platforms).unwrap_or_default();
            Err(ValidationError::OverCharLimit {
                limit,
                length: char_count(content),
            })
        }
        _ => Ok(()),
    }
}

pub fn is_submittable(draft: &PostDraft) -> bool {
    validate(draft).is_ok()
}
