//! Keys under which the console keeps its client-side state

/// Current access token.
pub const ACCESS_TOKEN: &str = "auth-token";
/// Current refresh token.
pub const REFRESH_TOKEN: &str = "refresh-token";
/// Project id sent along with publish submissions.
pub const DISPLAY_PROJECT_ID: &str = "displayProjectId";
/// Region selecting the job scheduler backend.
pub const REGION: &str = "region";
/// Display name of the signed-in user.
pub const USERNAME: &str = "username";
/// Repository the console was launched for.
pub const REPO_NAME: &str = "repo_name";
