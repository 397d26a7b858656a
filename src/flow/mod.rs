#[allow(clippy::module_inception)]
pub mod flow;
pub mod flow_tnl;
pub mod port_id;
pub mod wildcards;
