/// Route component constants shared across crates
pub const APP_ROUTE_COMPONENT: &str = "app";
pub const APP_ROUTE_PREFIX: &str = const_str::concat!("/", APP_ROUTE_COMPONENT);

pub const HEALTHCHECK_ROUTE_COMPONENT: &str = "healthcheck";
pub const HEALTHCHECK_PATH: &str =
    const_str::concat!(APP_ROUTE_PREFIX, "/", HEALTHCHECK_ROUTE_COMPONENT);

pub const STATUS_ROUTE_COMPONENT: &str = "status";
pub const STATUS_PATH: &str = const_str::concat!(APP_ROUTE_PREFIX, "/", STATUS_ROUTE_COMPONENT);

pub const WHOAMI_ROUTE_COMPONENT: &str = "whoami";

pub const LOGIN_ROUTE_COMPONENT: &str = "login";

/// Paths reachable from the local host without a negotiated identity in Windows mode.
pub const LOCAL_DIAGNOSTIC_PATHS: [&str; 2] = [HEALTHCHECK_PATH, STATUS_PATH];

pub const ODATA_ROUTE_COMPONENT: &str = "odata.svc";
pub const ODATA_ROUTE_PREFIX: &str = const_str::concat!("/", ODATA_ROUTE_COMPONENT);

/// Front-page extension endpoints used by office clients.
pub const OFFICE_PROTOCOL_PREFIX: &str = "/_vti_bin";

pub const REPOSITORY_ROOT_PATH: &str = "/Root";

/// Request header that marks a file-protocol crawler; such requests are always anonymous.
pub const CRAWLER_HEADER: &str = "x-crawler";

pub const ORIGINAL_URL_QUERY_PARAM: &str = "OriginalUrl";
pub const ACTION_QUERY_PARAM: &str = "action";
