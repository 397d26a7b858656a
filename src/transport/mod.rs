pub mod sctp;
pub mod tcp;
pub mod udp;
