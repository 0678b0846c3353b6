use crate::models::error::StudioError;
use crate::models::state::RouterState;

/// Event delegate for source router notifications.
///
/// Called on the thread that drove the transition. Implementations should
/// marshal to the UI thread if needed.
pub trait RouterDelegate: Send + Sync {
    /// Called after the router settles into a new state.
    fn on_state_changed(&self, state: RouterState);

    /// Called when a connect fails; the message is meant for the user.
    fn on_error(&self, error: &StudioError);
}
