/*
 * Responsibility
 * - map a directory lookup result to a TokenReview status
 * - pure function, no I/O
 */
use crate::api::v1::dto::token_review::{TokenReviewStatus, UserInfo};
use crate::services::directory::DirectoryRecord;

/// `authenticated` and `user` are always set together: a status is either
/// authenticated with a full identity, or unauthenticated with none.
///
/// The directory schema here has no separate immutable id attribute, so the
/// uid is the verified username itself.
pub fn resolve(record: Option<DirectoryRecord>, username: &str) -> TokenReviewStatus {
    match record {
        Some(record) => TokenReviewStatus {
            authenticated: true,
            user: Some(UserInfo {
                username: username.to_string(),
                uid: username.to_string(),
                groups: record.groups,
            }),
        },
        None => TokenReviewStatus {
            authenticated: false,
            user: None,
        },
    }
}
