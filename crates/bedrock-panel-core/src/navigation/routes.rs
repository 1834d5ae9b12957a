/// Path of the authentication view.
pub const LOGIN_PATH: &str = "/login";

/// Path of the forced password change view.
pub const ROTATION_PATH: &str = "/change-password";

/// Where a session holder lands after logging in.
pub const LANDING_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub name: &'static str,
    pub access: RouteAccess,
}

impl Route {
    const fn new(path: &'static str, name: &'static str, access: RouteAccess) -> Self {
        Self { path, name, access }
    }

    pub fn requires_auth(&self) -> bool {
        self.access == RouteAccess::Authenticated
    }

    pub fn is_login(&self) -> bool {
        self.path == LOGIN_PATH
    }

    pub fn is_rotation(&self) -> bool {
        self.path == ROTATION_PATH
    }
}

const ROUTES: &[Route] = &[
    Route::new(LOGIN_PATH, "Login", RouteAccess::Public),
    Route::new(LANDING_PATH, "Home", RouteAccess::Authenticated),
    Route::new("/config", "ServerConfig", RouteAccess::Authenticated),
    Route::new("/players", "PlayerManagement", RouteAccess::Authenticated),
    Route::new("/permissions", "PermissionManagement", RouteAccess::Authenticated),
    Route::new("/worlds", "WorldManagement", RouteAccess::Authenticated),
    Route::new("/resource-packs", "ResourcePackManagement", RouteAccess::Authenticated),
    Route::new("/versions", "ServerVersions", RouteAccess::Authenticated),
    Route::new("/commands", "CommandConsole", RouteAccess::Authenticated),
    Route::new("/logs", "LogViewer", RouteAccess::Authenticated),
    Route::new("/performance", "PerformanceMonitor", RouteAccess::Authenticated),
    Route::new(ROTATION_PATH, "ChangePassword", RouteAccess::Authenticated),
];

/// Every view the console knows about.
pub fn all() -> &'static [Route] {
    ROUTES
}

/// Look up a route by path. Query strings, fragments and a trailing slash
/// are ignored.
pub fn resolve(path: &str) -> Option<&'static Route> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = match path.trim_end_matches('/') {
        "" => LANDING_PATH,
        trimmed => trimmed,
    };
    ROUTES.iter().find(|r| r.path == path)
}
