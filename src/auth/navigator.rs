//! Redirect-to-route capability used when a session cannot be recovered

use std::sync::{Arc, PoisonError, RwLock};

use crate::types::RouteName;

/// Something that can move the app to a named route
///
/// Must never fail or panic: the coordinator calls it from the refresh path.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`
    fn navigate(&self, route: &RouteName);
}

impl<T: Navigator + ?Sized> Navigator for Arc<T> {
    fn navigate(&self, route: &RouteName) {
        (**self).navigate(route);
    }
}

/// Type alias for a shared navigator.
pub type SharedNavigator = Arc<dyn Navigator>;

/// Wrapper to convert a closure into a `Navigator`.
pub struct FnNavigator<F>
where
    F: Fn(&RouteName) + Send + Sync,
{
    func: F,
}

impl<F> FnNavigator<F>
where
    F: Fn(&RouteName) + Send + Sync,
{
    /// Create a new function-based navigator.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Navigator for FnNavigator<F>
where
    F: Fn(&RouteName) + Send + Sync,
{
    fn navigate(&self, route: &RouteName) {
        (self.func)(route);
    }
}

/// Late-bound navigator handle
///
/// Created before the UI exists and handed to the coordinator; the navigation
/// container mounts itself once ready. Calls made while nothing is mounted are
/// dropped with a warning.
///
/// ```
/// use nailkit_http::auth::{FnNavigator, NavigationRef, Navigator};
/// use nailkit_http::RouteName;
///
/// let nav = NavigationRef::new();
/// nav.navigate(&RouteName::login()); // warns, no-op
///
/// nav.mount(FnNavigator::new(|route| println!("-> {route}")));
/// assert!(nav.is_mounted());
/// nav.navigate(&RouteName::login());
/// ```
#[derive(Default)]
pub struct NavigationRef {
    current: RwLock<Option<SharedNavigator>>,
}

impl NavigationRef {
    /// Create an unmounted handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the live navigator
    pub fn mount(&self, navigator: impl Navigator + 'static) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(navigator));
        tracing::debug!("Navigator mounted");
    }

    /// Detach the live navigator
    pub fn unmount(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::debug!("Navigator unmounted");
    }

    /// Whether a navigator is attached
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Navigator for NavigationRef {
    fn navigate(&self, route: &RouteName) {
        let current = self
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match current {
            Some(navigator) => navigator.navigate(route),
            None => {
                tracing::warn!(route = %route, "Navigation requested before navigator was mounted");
            }
        }
    }
}

impl std::fmt::Debug for NavigationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationRef")
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
