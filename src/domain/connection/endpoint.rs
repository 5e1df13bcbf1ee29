//! Connection URL construction.

use url::form_urlencoded;

use crate::domain::session::Identity;

/// Query parameter carrying the user id.
pub const USER_ID_PARAM: &str = "userId";

/// Query parameter carrying the task id.
pub const TASK_ID_PARAM: &str = "taskId";

/// Appends the identity to the endpoint URL.
///
/// `/?userId=<id>` comes first when a user id is known, then `taskId=<id>`
/// joined with `&` or `/?` depending on whether a parameter was already
/// written. Without identity the base URL is returned unchanged.
pub fn connection_url(base: &str, identity: &Identity) -> String {
    let params = [
        (USER_ID_PARAM, identity.user_id().map(|id| id.as_str())),
        (TASK_ID_PARAM, identity.task_id().map(|id| id.as_str())),
    ];

    let mut url = base.to_string();
    let mut first = true;
    for (name, value) in params {
        let Some(value) = value else { continue };
        url.push_str(if first { "/?" } else { "&" });
        url.push_str(name);
        url.push('=');
        url.extend(form_urlencoded::byte_serialize(value.as_bytes()));
        first = false;
    }
    url
}
