pub mod doubles;
pub mod socket_guard;
