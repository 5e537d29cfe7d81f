// Connectivity observation: state snapshots, subscriptions, active probes.

mod monitor;
mod probe;
mod state;

pub use self::monitor::{NetworkMonitor, Subscription};
pub use self::probe::{ConnectivityProbe, HttpProbe, ProbeError};
pub use self::state::{ConnectionType, NetworkState, Reachability};
