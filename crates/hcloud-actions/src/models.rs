//! Action models and their wire decoding.

use chrono::{DateTime, Utc};
use hcloud_core::id::ActionId;
use hcloud_core::query::QueryParams;
use hcloud_core::resource::Resource;
use hcloud_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// The action is still in progress.
    Running,
    /// The action finished successfully.
    Success,
    /// The action failed.
    Error,
}

impl ActionStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// `running` is the only non-terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of resource affected by an action.
///
/// Kinds this crate does not know are kept verbatim in [`ResourceKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    /// A server.
    Server,
    /// An image.
    Image,
    /// An ISO.
    Iso,
    /// A floating IP.
    FloatingIp,
    /// A primary IP.
    PrimaryIp,
    /// A volume.
    Volume,
    /// A network.
    Network,
    /// A load balancer.
    LoadBalancer,
    /// A certificate.
    Certificate,
    /// A firewall.
    Firewall,
    /// A placement group.
    PlacementGroup,
    /// A DNS zone.
    Zone,
    /// Any other kind, kept as reported by the API.
    Other(String),
}

impl ResourceKind {
    /// Returns the wire name of the kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Server => "server",
            Self::Image => "image",
            Self::Iso => "iso",
            Self::FloatingIp => "floating_ip",
            Self::PrimaryIp => "primary_ip",
            Self::Volume => "volume",
            Self::Network => "network",
            Self::LoadBalancer => "load_balancer",
            Self::Certificate => "certificate",
            Self::Firewall => "firewall",
            Self::PlacementGroup => "placement_group",
            Self::Zone => "zone",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for ResourceKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "server" => Self::Server,
            "image" => Self::Image,
            "iso" => Self::Iso,
            "floating_ip" => Self::FloatingIp,
            "primary_ip" => Self::PrimaryIp,
            "volume" => Self::Volume,
            "network" => Self::Network,
            "load_balancer" => Self::LoadBalancer,
            "certificate" => Self::Certificate,
            "firewall" => Self::Firewall,
            "placement_group" => Self::PlacementGroup,
            "zone" => Self::Zone,
            _ => Self::Other(kind),
        }
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

/// Reference to a resource affected by an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResource {
    /// Resource ID.
    pub id: i64,
    /// Resource kind.
    #[serde(rename = "type")]
    pub kind: ResourceKind,
}

/// A server-side asynchronous operation.
///
/// The wire `error` object is flattened into [`Action::error_code`] and
/// [`Action::error_message`], which are empty unless the action failed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ActionSchema")]
pub struct Action {
    /// Action ID.
    pub id: ActionId,
    /// Current status.
    pub status: ActionStatus,
    /// Operation name, e.g. `create_server`.
    pub command: String,
    /// Progress in percent (0..=100).
    pub progress: u8,
    /// Start time; the Unix epoch when the payload omits it.
    pub started: DateTime<Utc>,
    /// Completion time, absent while running.
    pub finished: Option<DateTime<Utc>>,
    /// Error code when the action failed.
    pub error_code: String,
    /// Error message when the action failed.
    pub error_message: String,
    /// Resources affected by the action.
    pub resources: Vec<ActionResource>,
}

#[derive(Deserialize)]
struct ActionSchema {
    id: ActionId,
    #[serde(default)]
    command: String,
    status: ActionStatus,
    #[serde(default)]
    progress: u8,
    #[serde(default)]
    started: Option<DateTime<Utc>>,
    #[serde(default)]
    finished: Option<DateTime<Utc>>,
    #[serde(default)]
    error: Option<ActionErrorSchema>,
    #[serde(default)]
    resources: Vec<ActionResource>,
}

#[derive(Deserialize)]
struct ActionErrorSchema {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl From<ActionSchema> for Action {
    fn from(schema: ActionSchema) -> Self {
        let (error_code, error_message) = schema
            .error
            .map(|error| (error.code, error.message))
            .unwrap_or_default();

        let progress = match schema.status {
            ActionStatus::Success => 100,
            _ => schema.progress.min(100),
        };

        Self {
            id: schema.id,
            status: schema.status,
            command: schema.command,
            progress,
            started: schema.started.unwrap_or_default(),
            finished: schema.finished,
            error_code,
            error_message,
            resources: schema.resources,
        }
    }
}

impl Action {
    /// Returns true while the action has not reached a terminal status.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Returns the failure carried by the action, if it finished with status `error`.
    #[must_use]
    pub fn error(&self) -> Option<Error> {
        (self.status == ActionStatus::Error).then(|| Error::ActionFailed {
            id: self.id.get(),
            code: self.error_code.clone(),
            message: self.error_message.clone(),
        })
    }

    /// Returns true if the action affects the given resource.
    #[must_use]
    pub fn affects(&self, kind: &ResourceKind, id: i64) -> bool {
        self.resources
            .iter()
            .any(|resource| &resource.kind == kind && resource.id == id)
    }
}

impl Resource for Action {
    type Id = ActionId;
    const SINGULAR: &'static str = "action";
    const PLURAL: &'static str = "actions";
    const PATH: &'static str = "actions";
}

/// Response of a mutation that starts an action and possibly follow-up actions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionResult {
    /// The primary action.
    pub action: Action,
    /// Actions started implicitly by the mutation.
    #[serde(default)]
    pub next_actions: Vec<Action>,
}

impl ActionResult {
    /// Flatten into `[action, ...next_actions]`.
    #[must_use]
    pub fn into_actions(self) -> Vec<Action> {
        splice_actions(self.action, self.next_actions)
    }
}

/// Response of a mutation that starts several independent actions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionList {
    /// The started actions.
    pub actions: Vec<Action>,
}

/// Build the ordered sequence `[action, ...next_actions]`.
#[must_use]
pub fn splice_actions(action: Action, next_actions: Vec<Action>) -> Vec<Action> {
    let mut actions = Vec::with_capacity(next_actions.len() + 1);
    actions.push(action);
    actions.extend(next_actions);
    actions
}

/// Filters supported by the `/actions` list endpoint.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActionListParams {
    /// Only return these actions.
    pub ids: Vec<ActionId>,
    /// Only return actions in these states.
    pub statuses: Vec<ActionStatus>,
    /// Sort expressions, e.g. `started:desc`.
    pub sort: Vec<String>,
}

impl ActionListParams {
    /// Convert the filters into URL query pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = QueryParams::new();
        params.push_all("id", &self.ids);
        params.push_all("status", &self.statuses);
        params.push_all("sort", &self.sort);
        params.into_pairs()
    }
}
