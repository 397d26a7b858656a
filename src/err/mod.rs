//! Error types that can be triggered by this crate.

mod add_port_error;
pub use add_port_error::*;

mod build_header_error;
pub use build_header_error::*;

mod len_error;
pub use len_error::*;

mod parse_eth_addr_error;
pub use parse_eth_addr_error::*;
