//! Browser surface port: navigation and blocking alerts.

/// The page-level side effects the controller may trigger.
pub trait Browser {
    /// Leave the checkout page for `location` (path or absolute URL).
    fn navigate(&mut self, location: &str);

    /// Show a blocking message to the buyer.
    fn alert(&mut self, message: &str);
}
