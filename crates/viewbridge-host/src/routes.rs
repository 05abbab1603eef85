//! Method routing table.
//!
//! A request is routed by namespace first: when the part of its method
//! before the first `/` names a proxy namespace, it goes to the backend
//! verbatim. Otherwise the exact method is looked up among local commands.

use std::collections::{BTreeMap, BTreeSet};

use viewbridge_ipc::protocol::commands;

/// Commands the host answers itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    /// `bootstrap`
    Bootstrap,
    /// `slack-login`
    SlackLogin,
    /// `complete-signup`
    CompleteSignup,
    /// `login`
    Login,
    /// `update-configuration`
    UpdateConfiguration,
}

impl Command {
    /// Every local command.
    pub const ALL: [Self; 5] = [
        Self::Bootstrap,
        Self::SlackLogin,
        Self::CompleteSignup,
        Self::Login,
        Self::UpdateConfiguration,
    ];

    /// Method name on the wire.
    #[must_use]
    pub fn method(self) -> &'static str {
        match self {
            Self::Bootstrap => commands::BOOTSTRAP,
            Self::SlackLogin => commands::SLACK_LOGIN,
            Self::CompleteSignup => commands::COMPLETE_SIGNUP,
            Self::Login => commands::LOGIN,
            Self::UpdateConfiguration => commands::UPDATE_CONFIGURATION,
        }
    }
}

/// Where a request goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Forward to the backend unchanged.
    Proxy,
    /// Answer with a local handler.
    Local(Command),
}

/// Proxy namespaces and local commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    proxies: BTreeSet<String>,
    commands: BTreeMap<String, Command>,
}

impl RouteTable {
    /// An empty table. Nothing routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The host's table: `backend_namespace` proxied plus every [`Command`].
    #[must_use]
    pub fn standard(backend_namespace: &str) -> Self {
        Command::ALL
            .into_iter()
            .fold(Self::new().with_proxy(backend_namespace), Self::with_command)
    }

    /// Add a proxy namespace.
    #[must_use]
    pub fn with_proxy(mut self, namespace: impl Into<String>) -> Self {
        self.proxies.insert(namespace.into());
        self
    }

    /// Add a local command under its wire name.
    #[must_use]
    pub fn with_command(mut self, command: Command) -> Self {
        self.commands.insert(command.method().to_owned(), command);
        self
    }

    /// Route for `method`, or `None` when nothing handles it.
    #[must_use]
    pub fn resolve(&self, method: &str) -> Option<Route> {
        let namespace = method.split_once('/').map_or(method, |(ns, _)| ns);
        if self.proxies.contains(namespace) {
            return Some(Route::Proxy);
        }
        self.commands.get(method).copied().map(Route::Local)
    }

    /// Proxy namespaces.
    pub fn proxies(&self) -> impl Iterator<Item = &str> {
        self.proxies.iter().map(String::as_str)
    }

    /// Local commands keyed by method.
    pub fn commands(&self) -> impl Iterator<Item = (&str, Command)> {
        self.commands.iter().map(|(m, c)| (m.as_str(), *c))
    }
}
