mod arguments;
mod errors;
mod file_descriptor;
mod file_handle;
mod flags;
mod inode;

pub use self::{
    arguments::*, errors::*, file_descriptor::*, file_handle::*, flags::*, inode::*,
};
