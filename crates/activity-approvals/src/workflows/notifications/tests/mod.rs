mod common;
mod inbox;
