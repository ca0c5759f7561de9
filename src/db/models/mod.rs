mod booking;
mod pet_pass;
mod sitter_profile;
mod slot;

#[allow(unused)]
pub use booking::*;
#[allow(unused)]
pub use pet_pass::*;
#[allow(unused)]
pub use sitter_profile::*;
#[allow(unused)]
pub use slot::*;
